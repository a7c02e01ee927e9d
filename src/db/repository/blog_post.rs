use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{format_datetime, param_refs, parse_datetime, parse_opt_datetime, parse_uuid, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const POST_COLUMNS: &str = "id, title, slug, author, excerpt, content, tags, status,
     published_at, created_at, updated_at";

fn read_post(row: &Row<'_>) -> Result<BlogPost, DatabaseError> {
    let tags_json: String = row.get(6)?;
    Ok(BlogPost {
        id: parse_uuid("blog_posts", &row.get::<_, String>(0)?)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        author: row.get(3)?,
        excerpt: row.get(4)?,
        content: row.get(5)?,
        tags: serde_json::from_str(&tags_json).map_err(|e| DatabaseError::CorruptRow {
            table: "blog_posts",
            reason: format!("bad tags: {e}"),
        })?,
        status: PostStatus::from_str(&row.get::<_, String>(7)?)?,
        published_at: parse_opt_datetime("blog_posts", row.get(8)?)?,
        created_at: parse_datetime("blog_posts", &row.get::<_, String>(9)?)?,
        updated_at: parse_datetime("blog_posts", &row.get::<_, String>(10)?)?,
    })
}

fn tags_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub fn insert_blog_post(conn: &Connection, post: &BlogPost) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO blog_posts ({POST_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            post.id.to_string(),
            post.title,
            post.slug,
            post.author,
            post.excerpt,
            post.content,
            tags_json(&post.tags),
            post.status.as_str(),
            post.published_at.as_ref().map(format_datetime),
            format_datetime(&post.created_at),
            format_datetime(&post.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_blog_post(conn: &Connection, id: &Uuid) -> Result<Option<BlogPost>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ?1"))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_post).transpose()
}

pub fn get_blog_post_by_slug(conn: &Connection, slug: &str) -> Result<Option<BlogPost>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = ?1"))?;
    let mut rows = stmt.query(params![slug])?;
    rows.next()?.map(read_post).transpose()
}

/// Whether `slug` is taken by a post other than `except`.
pub fn slug_taken(conn: &Connection, slug: &str, except: Option<&Uuid>) -> Result<bool, DatabaseError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT id FROM blog_posts WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match (found, except) {
        (Some(id), Some(except)) => id != except.to_string(),
        (Some(_), None) => true,
        (None, _) => false,
    })
}

pub fn list_blog_posts(
    conn: &Connection,
    filter: &BlogPostFilter,
) -> Result<Vec<BlogPost>, DatabaseError> {
    let mut query = FilterQuery::new(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE 1=1"));
    query
        .and_opt("status = {}", filter.status.map(|s| s.as_str()))
        .and_opt(
            "EXISTS (SELECT 1 FROM json_each(blog_posts.tags) WHERE json_each.value = {})",
            filter.tag.as_deref().map(|t| t.trim().to_lowercase()),
        );
    let (sql, values) = query.finish("published_at DESC, created_at DESC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut posts = Vec::new();
    while let Some(row) = rows.next()? {
        posts.push(read_post(row)?);
    }
    Ok(posts)
}

pub fn update_blog_post(conn: &Connection, post: &BlogPost) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE blog_posts SET title = ?2, slug = ?3, author = ?4, excerpt = ?5, content = ?6,
         tags = ?7, status = ?8, published_at = ?9, updated_at = ?10
         WHERE id = ?1",
        params![
            post.id.to_string(),
            post.title,
            post.slug,
            post.author,
            post.excerpt,
            post.content,
            tags_json(&post.tags),
            post.status.as_str(),
            post.published_at.as_ref().map(format_datetime),
            format_datetime(&post.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("BlogPost", post.id));
    }
    Ok(())
}

pub fn delete_blog_post(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM blog_posts WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("BlogPost", id));
    }
    Ok(())
}
