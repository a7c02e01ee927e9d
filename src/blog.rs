//! Health blog: slugged posts with draft/published workflow.

use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, now_utc};
use crate::error::{OrNotFound, ServiceError, ServiceResult};
use crate::models::*;
use crate::validation::{self as v, Validated, ValidationError};

pub const EXCERPT_CHARS: usize = 160;
pub const MAX_TAGS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct BlogPostInput {
    pub title: String,
    pub author: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogPostPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

/// Lowercase ASCII words joined by single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// First free slug among `base`, `base-2`, `base-3`, ...
fn unique_slug(conn: &Connection, title: &str, except: Option<&Uuid>) -> ServiceResult<String> {
    let base = slugify(title);
    if !db::slug_taken(conn, &base, except)? {
        return Ok(base);
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !db::slug_taken(conn, &candidate, except)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn normalize_tags(tags: &[String]) -> Validated<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    if out.len() > MAX_TAGS {
        return Err(ValidationError::new(
            "tags",
            format!("at most {MAX_TAGS} tags allowed"),
        ));
    }
    Ok(out)
}

fn default_excerpt(content: &str) -> String {
    content.trim().chars().take(EXCERPT_CHARS).collect()
}

fn validate_post(post: &BlogPost) -> Validated<()> {
    v::required("title", &post.title)?;
    v::max_len("title", &post.title, 200)?;
    v::required("author", &post.author)?;
    v::required("content", &post.content)?;
    v::optional(post.excerpt.as_deref(), |e| v::max_len("excerpt", e, 500))?;
    Ok(())
}

pub fn create_post(conn: &Connection, input: BlogPostInput) -> ServiceResult<BlogPost> {
    let now = now_utc();
    let status = input.status.unwrap_or(PostStatus::Draft);
    let content = v::clean(&input.content);
    let mut post = BlogPost {
        id: Uuid::new_v4(),
        title: v::clean(&input.title),
        slug: String::new(),
        author: v::clean(&input.author),
        excerpt: v::clean_opt(input.excerpt.as_deref()).or_else(|| Some(default_excerpt(&content))),
        content,
        tags: normalize_tags(&input.tags)?,
        status,
        published_at: (status == PostStatus::Published).then_some(now),
        created_at: now,
        updated_at: now,
    };
    validate_post(&post)?;
    post.slug = unique_slug(conn, &post.title, None)?;
    db::insert_blog_post(conn, &post)?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");
    Ok(post)
}

pub fn get_post(conn: &Connection, id: &Uuid) -> ServiceResult<BlogPost> {
    db::get_blog_post(conn, id).or_not_found("BlogPost")
}

/// Look up by slug, falling back to id when the key parses as a UUID.
pub fn find_post(conn: &Connection, key: &str) -> ServiceResult<BlogPost> {
    if let Some(post) = db::get_blog_post_by_slug(conn, key)? {
        return Ok(post);
    }
    match Uuid::parse_str(key) {
        Ok(id) => get_post(conn, &id),
        Err(_) => Err(ServiceError::NotFound { entity: "BlogPost" }),
    }
}

pub fn list_posts(conn: &Connection, filter: &BlogPostFilter) -> ServiceResult<Vec<BlogPost>> {
    Ok(db::list_blog_posts(conn, filter)?)
}

pub fn update_post(conn: &Connection, id: &Uuid, patch: BlogPostPatch) -> ServiceResult<BlogPost> {
    let mut post = get_post(conn, id)?;
    let now = now_utc();

    if let Some(title) = patch.title {
        let title = v::clean(&title);
        if title != post.title {
            post.title = title;
            v::required("title", &post.title)?;
            post.slug = unique_slug(conn, &post.title, Some(&post.id))?;
        }
    }
    if let Some(author) = patch.author {
        post.author = v::clean(&author);
    }
    // An excerpt equal to the one derived from the old content was never
    // written by hand, so it follows the content.
    let derived_excerpt = post
        .excerpt
        .as_deref()
        .map_or(true, |e| e == default_excerpt(&post.content));
    if let Some(content) = patch.content {
        post.content = v::clean(&content);
    }
    match patch.excerpt {
        Some(excerpt) => {
            post.excerpt =
                v::clean_opt(Some(&excerpt)).or_else(|| Some(default_excerpt(&post.content)));
        }
        None if derived_excerpt => post.excerpt = Some(default_excerpt(&post.content)),
        None => {}
    }
    if let Some(tags) = patch.tags {
        post.tags = normalize_tags(&tags)?;
    }
    if let Some(status) = patch.status {
        if status != post.status {
            post.published_at = (status == PostStatus::Published).then_some(now);
            post.status = status;
        }
    }

    validate_post(&post)?;
    post.updated_at = now;
    db::update_blog_post(conn, &post)?;
    Ok(post)
}

pub fn publish_post(conn: &Connection, id: &Uuid) -> ServiceResult<BlogPost> {
    let mut post = get_post(conn, id)?;
    if post.status == PostStatus::Published {
        return Err(ServiceError::conflict("Post is already published"));
    }
    let now = now_utc();
    post.status = PostStatus::Published;
    post.published_at = Some(now);
    post.updated_at = now;
    db::update_blog_post(conn, &post)?;
    tracing::info!(post_id = %post.id, "Blog post published");
    Ok(post)
}

pub fn delete_post(conn: &Connection, id: &Uuid) -> ServiceResult<()> {
    get_post(conn, id)?;
    db::delete_blog_post(conn, id)?;
    Ok(())
}
