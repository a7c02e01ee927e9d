use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(LabStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Suspended => "suspended",
});

str_enum!(TestCategory {
    Blood => "blood",
    Urine => "urine",
    Imaging => "imaging",
    Cardiac => "cardiac",
    Hormone => "hormone",
    Infection => "infection",
    Genetic => "genetic",
    Other => "other",
});

str_enum!(PostStatus {
    Draft => "draft",
    Published => "published",
});

str_enum!(RecordType {
    LabReport => "lab_report",
    Prescription => "prescription",
    Diagnosis => "diagnosis",
    Vaccination => "vaccination",
    Imaging => "imaging",
    Consultation => "consultation",
    Other => "other",
});

str_enum!(CollectionType {
    LabVisit => "lab_visit",
    HomeCollection => "home_collection",
});

str_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    SampleCollected => "sample_collected",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(ConsultationMode {
    InPerson => "in_person",
    Video => "video",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

str_enum!(OnboardingStep {
    LabDetails => "lab_details",
    Location => "location",
    Services => "services",
    Tests => "tests",
    Review => "review",
});

str_enum!(OnboardingStatus {
    InProgress => "in_progress",
    Submitted => "submitted",
});

str_enum!(UserRole {
    Patient => "patient",
    Doctor => "doctor",
    LabOwner => "lab_owner",
    Admin => "admin",
});

impl Default for CollectionType {
    fn default() -> Self {
        Self::LabVisit
    }
}

impl Default for ConsultationMode {
    fn default() -> Self {
        Self::InPerson
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Patient
    }
}

impl BookingStatus {
    /// Whether a booking may move from `self` to `next`.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, SampleCollected)
                | (Confirmed, Cancelled)
                | (SampleCollected, Completed)
        )
    }
}

impl AppointmentStatus {
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        *self == AppointmentStatus::Scheduled && next != AppointmentStatus::Scheduled
    }
}

impl OnboardingStep {
    /// Position in the wizard, starting at 0.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<OnboardingStep> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn enum_round_trips_through_str() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::from_str(status.as_str()).unwrap(), *status);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = LabStatus::from_str("archived").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn serde_uses_snake_case_strings() {
        let json = serde_json::to_string(&BookingStatus::SampleCollected).unwrap();
        assert_eq!(json, "\"sample_collected\"");
        let role: UserRole = serde_json::from_str("\"lab_owner\"").unwrap();
        assert_eq!(role, UserRole::LabOwner);
    }

    #[test]
    fn booking_transitions_follow_lifecycle() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(SampleCollected));
        assert!(SampleCollected.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!SampleCollected.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Confirmed));
    }

    #[test]
    fn appointment_terminal_states_are_final() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(NoShow));
        assert!(!Scheduled.can_transition_to(Scheduled));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn onboarding_steps_are_ordered() {
        assert_eq!(OnboardingStep::LabDetails.index(), 0);
        assert_eq!(OnboardingStep::Review.index(), 4);
        assert_eq!(OnboardingStep::Tests.next(), Some(OnboardingStep::Review));
        assert_eq!(OnboardingStep::Review.next(), None);
    }
}
