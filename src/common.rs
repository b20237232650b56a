use serde::Serialize;

pub const CHANNELS: usize = 3;
pub const HEIGHT: usize = 512;
pub const WIDTH: usize = 512;

/// Ordinal diabetic-retinopathy severity grades, in checkpoint class order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "No DR")]
    NoDr,
    Mild,
    Moderate,
    Severe,
    #[serde(rename = "Proliferative DR")]
    Proliferative,
}

impl Grade {
    pub const ALL: [Grade; 5] = [
        Grade::NoDr,
        Grade::Mild,
        Grade::Moderate,
        Grade::Severe,
        Grade::Proliferative,
    ];

    pub fn from_index(index: usize) -> Option<Grade> {
        Grade::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::NoDr => "No DR",
            Grade::Mild => "Mild",
            Grade::Moderate => "Moderate",
            Grade::Severe => "Severe",
            Grade::Proliferative => "Proliferative DR",
        }
    }
}
