use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo_types::User;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), &time::macros::format_description!("[year]-[month]-[day]")).ok()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Experience not found")]
    ExperienceNotFound,
    #[error("Education not found")]
    EducationNotFound,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Social {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl Social {
    /// Overwrites only the links present in `other`.
    fn merge(&mut self, other: Social) {
        let Social {
            youtube,
            twitter,
            facebook,
            linkedin,
            instagram,
        } = other;
        overwrite(&mut self.youtube, youtube);
        overwrite(&mut self.twitter, twitter);
        overwrite(&mut self.facebook, facebook);
        overwrite(&mut self.linkedin, linkedin);
        overwrite(&mut self.instagram, instagram);
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experience {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(with = "iso_date")]
    pub from: Date,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Education {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    #[serde(with = "iso_date")]
    pub from: Date,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial profile update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social: Social,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    pub skills: Vec<String>,
    pub social: Social,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Profile {
    pub fn new(user_id: Uuid, patch: ProfilePatch) -> Self {
        let mut profile = Self {
            id: Uuid::new_v4(),
            user_id,
            company: None,
            website: None,
            location: None,
            bio: None,
            status: String::new(),
            githubusername: None,
            skills: Vec::new(),
            social: Social::default(),
            experience: Vec::new(),
            education: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        profile.apply(patch);
        profile
    }

    pub fn apply(&mut self, patch: ProfilePatch) {
        let ProfilePatch {
            company,
            website,
            location,
            bio,
            status,
            githubusername,
            skills,
            social,
        } = patch;
        overwrite(&mut self.company, company);
        overwrite(&mut self.website, website);
        overwrite(&mut self.location, location);
        overwrite(&mut self.bio, bio);
        overwrite(&mut self.githubusername, githubusername);
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(skills) = skills {
            self.skills = skills;
        }
        self.social.merge(social);
    }

    /// Newest entries go first.
    pub fn add_experience(&mut self, entry: Experience) {
        self.experience.insert(0, entry);
    }

    pub fn remove_experience(&mut self, id: Uuid) -> Result<Experience, ProfileError> {
        let pos = self
            .experience
            .iter()
            .position(|e| e.id == id)
            .ok_or(ProfileError::ExperienceNotFound)?;
        Ok(self.experience.remove(pos))
    }

    pub fn add_education(&mut self, entry: Education) {
        self.education.insert(0, entry);
    }

    pub fn remove_education(&mut self, id: Uuid) -> Result<Education, ProfileError> {
        let pos = self
            .education
            .iter()
            .position(|e| e.id == id)
            .ok_or(ProfileError::EducationNotFound)?;
        Ok(self.education.remove(pos))
    }
}

/// Owner fields populated into a profile response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileOwner {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

impl From<&User> for ProfileOwner {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub user: ProfileOwner,
}

/// Splits a comma separated skill list, trimming entries and dropping blanks.
pub fn normalize_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
