use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::ReferenceEntry;

/// Where a value sits relative to its reference band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Low,
    Normal,
    High,
}

impl Status {
    /// Both band edges count as normal.
    pub fn of(value: f64, low: f64, high: f64) -> Self {
        if value < low {
            Status::Low
        } else if value > high {
            Status::High
        } else {
            Status::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Low => "Low",
            Status::Normal => "Normal",
            Status::High => "High",
        }
    }

    pub fn is_abnormal(self) -> bool {
        self != Status::Normal
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Low" => Ok(Status::Low),
            "Normal" => Ok(Status::Normal),
            "High" => Ok(Status::High),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Which way a change is good news for a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// Clinical grouping that decides advisory wording and favorable direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Glycemic,
    Lipid,
    HdlCholesterol,
    LdlCholesterol,
    IronStudies,
    Vitamin,
    Thyroid,
    Hepatic,
    RenalMarker,
    FiltrationRate,
    BloodCount,
    WhiteCells,
    Generic,
}

impl Category {
    pub fn of(test: &str) -> Self {
        match test {
            "Glucose" | "HbA1c" => Category::Glycemic,
            "Total Cholesterol" | "Triglycerides" => Category::Lipid,
            "HDL" => Category::HdlCholesterol,
            "LDL" => Category::LdlCholesterol,
            "Iron" | "Ferritin" | "TIBC" | "Transferrin Saturation" => Category::IronStudies,
            "Vitamin D" | "Vitamin B12" | "Folate" => Category::Vitamin,
            "TSH" | "T3" | "T4" | "Free T4" | "Free T3" => Category::Thyroid,
            "ALT" | "AST" | "ALP" | "GGT" => Category::Hepatic,
            "BUN" | "Creatinine" => Category::RenalMarker,
            "eGFR" => Category::FiltrationRate,
            "Hemoglobin" | "Hematocrit" | "RBC" => Category::BloodCount,
            "WBC" | "Neutrophils" | "Lymphocytes" => Category::WhiteCells,
            _ => Category::Generic,
        }
    }

    /// `None` when neither direction of change is clearly better.
    pub fn favorable_direction(self) -> Option<Direction> {
        match self {
            Category::Glycemic | Category::Lipid | Category::LdlCholesterol => {
                Some(Direction::LowerIsBetter)
            }
            Category::HdlCholesterol => Some(Direction::HigherIsBetter),
            Category::IronStudies
            | Category::Vitamin
            | Category::Thyroid
            | Category::Hepatic
            | Category::RenalMarker
            | Category::FiltrationRate
            | Category::BloodCount
            | Category::WhiteCells
            | Category::Generic => None,
        }
    }

    pub fn advisory(self, status: Status) -> &'static str {
        use Status::{High, Low, Normal};

        match (self, status) {
            (Category::Glycemic, Low) => "Low – Blood sugar is below normal. May indicate hypoglycemia or need for dietary adjustment.",
            (Category::Glycemic, High) => "High – Blood sugar is elevated. Consider diet, exercise, and follow up with your doctor.",
            (Category::Glycemic, Normal) => "Normal – Blood sugar levels are within healthy range.",

            (Category::Lipid, Low) => "Low – Below normal range. Generally good for cardiovascular health.",
            (Category::Lipid, High) => "High – Elevated levels. Consider dietary changes and lifestyle modifications.",
            (Category::Lipid, Normal) => "Normal – Within healthy range for cardiovascular health.",

            // Higher HDL is protective, so only a low value is flagged.
            (Category::HdlCholesterol, Low) => "Low – Good cholesterol is low. Consider increasing exercise and healthy fats.",
            (Category::HdlCholesterol, Normal | High) => "Normal – Good cholesterol levels are adequate.",

            (Category::LdlCholesterol, High) => "High – Bad cholesterol is elevated. Consider diet changes and exercise.",
            (Category::LdlCholesterol, Normal | Low) => "Normal – Bad cholesterol is within healthy range.",

            (Category::IronStudies, Low) => "Low – May indicate iron deficiency. Consider iron-rich foods or supplements.",
            (Category::IronStudies, High) => "High – Elevated iron levels. May need further evaluation for iron overload.",
            (Category::IronStudies, Normal) => "Normal – Iron levels are within healthy range.",

            (Category::Vitamin, Low) => "Low – Vitamin deficiency detected. Consider supplementation and dietary sources.",
            (Category::Vitamin, High) => "High – Vitamin levels are elevated. Generally not concerning but monitor intake.",
            (Category::Vitamin, Normal) => "Normal – Vitamin levels are adequate.",

            (Category::Thyroid, Low) => "Low – May indicate hyperthyroidism. Consult with your doctor for evaluation.",
            (Category::Thyroid, High) => "High – May indicate hypothyroidism. Follow up with healthcare provider.",
            (Category::Thyroid, Normal) => "Normal – Thyroid function appears normal.",

            (Category::Hepatic, Low) => "Low – Below normal range. Generally not concerning for liver function.",
            (Category::Hepatic, High) => "High – Liver enzymes are elevated. May indicate liver stress or damage.",
            (Category::Hepatic, Normal) => "Normal – Liver function appears normal.",

            (Category::RenalMarker, Low) => "Low – Below normal range. Generally indicates good kidney function.",
            (Category::RenalMarker, High) => "High – May indicate reduced kidney function. Consult your healthcare provider.",
            (Category::RenalMarker, Normal) => "Normal – Kidney function markers are within healthy range.",

            (Category::FiltrationRate, Low) => "Low – Kidney function may be reduced. Follow up with your doctor.",
            (Category::FiltrationRate, Normal | High) => "Normal – Kidney function appears normal.",

            (Category::BloodCount, Low) => "Low – May indicate anemia or iron deficiency. Consider iron-rich foods.",
            (Category::BloodCount, High) => "High – Elevated levels. May need further evaluation.",
            (Category::BloodCount, Normal) => "Normal – Blood count is within healthy range.",

            (Category::WhiteCells, Low) => "Low – White blood cell count is low. May indicate infection or immune issue.",
            (Category::WhiteCells, High) => "High – White blood cell count is elevated. May indicate infection or inflammation.",
            (Category::WhiteCells, Normal) => "Normal – Immune system markers are within healthy range.",

            (Category::Generic, Low) => "Low – Below normal range. Consider consulting with a healthcare provider.",
            (Category::Generic, High) => "High – Above normal range. You may want to follow up with your doctor.",
            (Category::Generic, Normal) => "Normal – Within healthy range.",
        }
    }
}

/// Whether a change between two readings is good news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Favorable,
    Unfavorable,
}

/// Judge a raw change for a test; `None` for tests without a preferred
/// direction or for a zero change.
pub fn judge_change(test: &str, change: f64) -> Option<Outcome> {
    let direction = Category::of(test).favorable_direction()?;
    if change == 0.0 {
        return None;
    }
    let improved = match direction {
        Direction::LowerIsBetter => change < 0.0,
        Direction::HigherIsBetter => change > 0.0,
    };
    Some(if improved {
        Outcome::Favorable
    } else {
        Outcome::Unfavorable
    })
}

/// Status plus the category-specific advisory for one reading.
pub fn classify(test: &str, value: f64, reference: &ReferenceEntry) -> (Status, &'static str) {
    let status = Status::of(value, reference.low, reference.high);
    (status, Category::of(test).advisory(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, low: f64, high: f64) -> ReferenceEntry {
        ReferenceEntry {
            name: name.to_string(),
            low,
            high,
            unit: "mg/dL".to_string(),
        }
    }

    #[test]
    fn band_edges_are_normal() {
        let glucose = entry("Glucose", 70.0, 99.0);
        assert_eq!(classify("Glucose", 70.0, &glucose).0, Status::Normal);
        assert_eq!(classify("Glucose", 99.0, &glucose).0, Status::Normal);
        assert_eq!(classify("Glucose", 69.9, &glucose).0, Status::Low);
        assert_eq!(classify("Glucose", 99.1, &glucose).0, Status::High);
        assert!(!Status::Normal.is_abnormal());
        assert!(Status::Low.is_abnormal() && Status::High.is_abnormal());
    }

    #[test]
    fn glucose_above_band_gets_glycemic_advice() {
        let (status, message) = classify("Glucose", 150.0, &entry("Glucose", 70.0, 99.0));
        assert_eq!(status, Status::High);
        assert!(message.starts_with("High – Blood sugar is elevated"));
    }

    #[test]
    fn high_hdl_reads_as_adequate() {
        let (status, message) = classify("HDL", 95.0, &entry("HDL", 40.0, 60.0));
        assert_eq!(status, Status::High);
        assert!(message.starts_with("Normal – Good cholesterol"));
    }

    #[test]
    fn low_ldl_reads_as_healthy() {
        let (status, message) = classify("LDL", 40.0, &entry("LDL", 50.0, 100.0));
        assert_eq!(status, Status::Low);
        assert!(message.starts_with("Normal – Bad cholesterol"));
    }

    #[test]
    fn unknown_test_uses_generic_template() {
        let (status, message) = classify("Zinc", 10.0, &entry("Zinc", 60.0, 120.0));
        assert_eq!(status, Status::Low);
        assert_eq!(Category::of("Zinc"), Category::Generic);
        assert!(message.starts_with("Low – Below normal range. Consider consulting"));
    }

    #[test]
    fn favorable_direction_follows_category() {
        assert_eq!(judge_change("Total Cholesterol", -20.0), Some(Outcome::Favorable));
        assert_eq!(judge_change("Glucose", 12.0), Some(Outcome::Unfavorable));
        assert_eq!(judge_change("HDL", 5.0), Some(Outcome::Favorable));
        assert_eq!(judge_change("HDL", -5.0), Some(Outcome::Unfavorable));
        assert_eq!(judge_change("TSH", 1.0), None);
        assert_eq!(judge_change("LDL", 0.0), None);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [Status::Low, Status::Normal, Status::High] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("Critical".parse::<Status>().is_err());
    }
}
