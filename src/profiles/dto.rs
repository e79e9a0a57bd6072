use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use super::model::{normalize_skills, parse_date, Education, Experience, ProfilePatch, Social};
use crate::error::{AppResult, Validator};

/// Blank strings count as "not provided".
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request body for creating or updating the caller's profile.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    /// Comma separated.
    pub skills: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl ProfileRequest {
    pub fn validate(self) -> AppResult<ProfilePatch> {
        Validator::new()
            .required("status", self.status.as_deref(), "Status is required")
            .required("skills", self.skills.as_deref(), "Skills is required")
            .finish()?;

        Ok(ProfilePatch {
            company: provided(self.company),
            website: provided(self.website),
            location: provided(self.location),
            bio: provided(self.bio),
            status: provided(self.status),
            githubusername: provided(self.githubusername),
            skills: self.skills.as_deref().map(normalize_skills),
            social: Social {
                youtube: provided(self.youtube),
                twitter: provided(self.twitter),
                facebook: provided(self.facebook),
                linkedin: provided(self.linkedin),
                instagram: provided(self.instagram),
            },
        })
    }
}

/// Checks an optional `to` date: blank is fine, garbage is not.
fn optional_date(raw: Option<&str>) -> Result<Option<Date>, ()> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_date(s).map(Some).ok_or(()),
    }
}

fn date_range(
    v: &mut Validator,
    from: Option<&str>,
    to: Option<&str>,
    current: bool,
) -> (Option<Date>, Option<Date>) {
    let from_date = from.and_then(parse_date);
    if from.map_or(false, |s| !s.trim().is_empty()) {
        v.check(from_date.is_some(), "from", "From date must be YYYY-MM-DD");
    }
    let to_date = optional_date(to);
    v.check(to_date.is_ok(), "to", "To date must be YYYY-MM-DD");
    let to_date = if current { None } else { to_date.unwrap_or(None) };
    (from_date, to_date)
}

#[derive(Debug, Default, Deserialize)]
pub struct ExperienceRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl ExperienceRequest {
    pub fn validate(self) -> AppResult<Experience> {
        let mut v = Validator::new();
        v.required("title", self.title.as_deref(), "Title is required")
            .required("company", self.company.as_deref(), "Company is required")
            .required("from", self.from.as_deref(), "From date is required");
        let (from, to) = date_range(&mut v, self.from.as_deref(), self.to.as_deref(), self.current);
        v.finish()?;

        Ok(Experience {
            id: Uuid::new_v4(),
            title: provided(self.title).unwrap_or_default(),
            company: provided(self.company).unwrap_or_default(),
            location: provided(self.location),
            // finish() above guarantees a parsed date
            from: from.unwrap_or(Date::MIN),
            to,
            current: self.current,
            description: provided(self.description),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EducationRequest {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub fieldofstudy: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl EducationRequest {
    pub fn validate(self) -> AppResult<Education> {
        let mut v = Validator::new();
        v.required("school", self.school.as_deref(), "School is required")
            .required("degree", self.degree.as_deref(), "Degree is required")
            .required(
                "fieldofstudy",
                self.fieldofstudy.as_deref(),
                "Field of study is required",
            )
            .required("from", self.from.as_deref(), "From date is required");
        let (from, to) = date_range(&mut v, self.from.as_deref(), self.to.as_deref(), self.current);
        v.finish()?;

        Ok(Education {
            id: Uuid::new_v4(),
            school: provided(self.school).unwrap_or_default(),
            degree: provided(self.degree).unwrap_or_default(),
            fieldofstudy: provided(self.fieldofstudy).unwrap_or_default(),
            from: from.unwrap_or(Date::MIN),
            to,
            current: self.current,
            description: provided(self.description),
        })
    }
}
