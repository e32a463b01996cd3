//! Shared identifiers and the fixed form vocabularies.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque 128-bit record identifier.
pub type RecordId = Uuid;
/// Identity string handed over by the authentication collaborator.
pub type Owner = String;

/// Options offered by the "Study Phase" select box.
pub const STUDY_PHASES: [&str; 5] = ["", "Phase I", "Phase II", "Phase III", "Phase IV"];
/// Options offered by the "eCOA Device Type" select box.
pub const DEVICE_TYPES: [&str; 4] = ["", "BYOD", "Provisioned Device", "Both"];

/// Returned when a label matches no known vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    /// Vocabulary that was searched.
    pub kind: &'static str,
    /// Label as received.
    pub label: String,
}

/// General scoping question, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeneralField {
    /// Sponsoring company.
    #[serde(rename = "Sponsor")]
    Sponsor,
    /// Sponsor study or protocol number.
    #[serde(rename = "Sponsor Study/Protocol #", alias = "Protocol#", alias = "Protocol #")]
    Protocol,
    /// Study title.
    #[serde(rename = "Study Title")]
    StudyTitle,
    /// Study phase, one of [`STUDY_PHASES`] in practice.
    #[serde(rename = "Study Phase")]
    StudyPhase,
    /// Indication.
    #[serde(rename = "Indication")]
    Indication,
    /// eCOA device type, one of [`DEVICE_TYPES`] in practice.
    #[serde(rename = "eCOA Device Type")]
    DeviceType,
    /// Estimated first patient in, stored as `YYYY-MM-DD`.
    #[serde(rename = "Estimated First Patient In (FPI)", alias = "Estimated FPI")]
    EstimatedFpi,
}

impl GeneralField {
    /// Every field in form order.
    pub const ALL: [GeneralField; 7] = [
        GeneralField::Sponsor,
        GeneralField::Protocol,
        GeneralField::StudyTitle,
        GeneralField::StudyPhase,
        GeneralField::Indication,
        GeneralField::DeviceType,
        GeneralField::EstimatedFpi,
    ];

    /// Storage key and display label.
    pub fn label(self) -> &'static str {
        match self {
            GeneralField::Sponsor => "Sponsor",
            GeneralField::Protocol => "Sponsor Study/Protocol #",
            GeneralField::StudyTitle => "Study Title",
            GeneralField::StudyPhase => "Study Phase",
            GeneralField::Indication => "Indication",
            GeneralField::DeviceType => "eCOA Device Type",
            GeneralField::EstimatedFpi => "Estimated First Patient In (FPI)",
        }
    }

    /// True for fields whose input offers prior values plus an "Other" escape.
    pub fn offers_suggestions(self) -> bool {
        matches!(self, GeneralField::Sponsor | GeneralField::Protocol)
    }

    /// Looks a field up by label or short alias.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(field) = Self::ALL.into_iter().find(|f| f.label() == label) {
            return Some(field);
        }
        match label {
            "Protocol#" | "Protocol #" => Some(GeneralField::Protocol),
            "Estimated FPI" => Some(GeneralField::EstimatedFpi),
            _ => None,
        }
    }
}

impl fmt::Display for GeneralField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GeneralField {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownLabel {
            kind: "general field",
            label: s.to_string(),
        })
    }
}

/// Therapeutic area offered by the multi-select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TherapeuticArea {
    /// Addiction.
    #[serde(rename = "Addiction")]
    Addiction,
    /// Allergy.
    #[serde(rename = "Allergy")]
    Allergy,
    /// Analgesia, anesthesiology and anti-inflammatory.
    #[serde(rename = "Analgesia/Anesthesiology/Anti-inflammatory")]
    Analgesia,
    /// Autoimmune.
    #[serde(rename = "Autoimmune")]
    Autoimmune,
    /// Cardiology and cardiovascular.
    #[serde(rename = "Cardiology/Cardiovascular")]
    Cardiology,
    /// Dermatology.
    #[serde(rename = "Dermatology")]
    Dermatology,
}

impl TherapeuticArea {
    /// Full vocabulary in display order.
    pub const ALL: [TherapeuticArea; 6] = [
        TherapeuticArea::Addiction,
        TherapeuticArea::Allergy,
        TherapeuticArea::Analgesia,
        TherapeuticArea::Autoimmune,
        TherapeuticArea::Cardiology,
        TherapeuticArea::Dermatology,
    ];

    /// Display label, identical to the stored string.
    pub fn label(self) -> &'static str {
        match self {
            TherapeuticArea::Addiction => "Addiction",
            TherapeuticArea::Allergy => "Allergy",
            TherapeuticArea::Analgesia => "Analgesia/Anesthesiology/Anti-inflammatory",
            TherapeuticArea::Autoimmune => "Autoimmune",
            TherapeuticArea::Cardiology => "Cardiology/Cardiovascular",
            TherapeuticArea::Dermatology => "Dermatology",
        }
    }
}

impl fmt::Display for TherapeuticArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TherapeuticArea {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|area| area.label() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "therapeutic area",
                label: s.to_string(),
            })
    }
}
