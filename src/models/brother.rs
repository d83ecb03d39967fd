//! Brother (lodge member) model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A member's rank within the three-tier progression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Degree {
    Aprendiz,
    Companheiro,
    Mestre,
}

impl Degree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degree::Aprendiz => "aprendiz",
            Degree::Companheiro => "companheiro",
            Degree::Mestre => "mestre",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "aprendiz" => Some(Degree::Aprendiz),
            "companheiro" => Some(Degree::Companheiro),
            "mestre" => Some(Degree::Mestre),
            _ => None,
        }
    }

    /// Label used in printed reports.
    pub fn label(&self) -> &'static str {
        match self {
            Degree::Aprendiz => "Aprendiz",
            Degree::Companheiro => "Companheiro",
            Degree::Mestre => "Mestre",
        }
    }
}

/// A lodge member record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brother {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cim: Option<String>,
    pub degree: Degree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiation_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new brother.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrotherRequest {
    pub name: String,
    #[serde(default)]
    pub cim: Option<String>,
    #[serde(default = "default_degree")]
    pub degree: Degree,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub initiation_date: Option<NaiveDate>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_degree() -> Degree {
    Degree::Aprendiz
}

fn default_active() -> bool {
    true
}

/// Request body for updating an existing brother.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrotherRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cim: Option<String>,
    #[serde(default)]
    pub degree: Option<Degree>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub initiation_date: Option<NaiveDate>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Query parameters for listing brothers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrotherFilter {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub degree: Option<Degree>,
}
