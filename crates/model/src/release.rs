use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 3GPP release metadata block attached to a record. All fields come from
/// the Releases reference table of the database export; everything is
/// optional because historic releases predate most of the columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version2g: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version3g: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub defunct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpm_code_2g: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpm_code_3g: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_meeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_stage1_meeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_stage2_meeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_stage3_meeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_meeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_end: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defunct_defaults_false() {
        let release = Release {
            freeze_meeting: Some("SP-46".into()),
            ..Release::default()
        };
        assert!(!release.defunct);
        assert_eq!(release.freeze_meeting.as_deref(), Some("SP-46"));
    }

    #[test]
    fn project_dates_parse_as_calendar_dates() {
        let release = Release {
            project_start: NaiveDate::from_ymd_opt(1999, 1, 1),
            project_end: NaiveDate::from_ymd_opt(2000, 6, 30),
            ..Release::default()
        };
        assert!(release.project_start.unwrap() < release.project_end.unwrap());
    }
}
