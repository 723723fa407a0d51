use std::collections::HashMap;

/// Built-in synonyms and abbreviations seen on lab reports, keyed by
/// canonical test name. Earlier variants are tried first.
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("Hemoglobin", &["Hemoglobin", "Hgb", "Hb", "HGB"]),
    ("Hematocrit", &["Hematocrit", "Hct", "HCT"]),
    ("RBC", &["RBC", "Red Blood Cell", "Red Blood Cells", "Erythrocytes"]),
    ("WBC", &["WBC", "White Blood Cell", "White Blood Cells", "Leukocytes"]),
    ("Platelets", &["Platelets", "PLT", "Thrombocytes"]),
    ("MCV", &["MCV", "Mean Corpuscular Volume"]),
    ("MCH", &["MCH", "Mean Corpuscular Hemoglobin"]),
    ("MCHC", &["MCHC", "Mean Corpuscular Hemoglobin Concentration"]),
    ("RDW", &["RDW", "Red Cell Distribution Width"]),
    ("Neutrophils", &["Neutrophils", "Neut", "PMN"]),
    ("Lymphocytes", &["Lymphocytes", "Lymph", "LYM"]),
    ("Monocytes", &["Monocytes", "Mono", "MON"]),
    ("Eosinophils", &["Eosinophils", "Eos", "EOS"]),
    ("Basophils", &["Basophils", "Baso", "BAS"]),
    ("Glucose", &["Glucose", "GLU", "Blood Sugar", "BS"]),
    ("HbA1c", &["HbA1c", "A1C", "Hemoglobin A1c", "Glycated Hemoglobin"]),
    ("BUN", &["BUN", "Blood Urea Nitrogen", "Urea"]),
    ("Creatinine", &["Creatinine", "CREAT", "Cr"]),
    ("eGFR", &["eGFR", "GFR", "Estimated GFR"]),
    ("Sodium", &["Sodium", "Na", "NA"]),
    ("Potassium", &["Potassium", "K", "K+"]),
    ("Chloride", &["Chloride", "Cl", "CL"]),
    ("CO2", &["CO2", "Carbon Dioxide", "Bicarbonate", "HCO3"]),
    ("Calcium", &["Calcium", "Ca", "CA"]),
    ("Phosphorus", &["Phosphorus", "Phos", "PO4", "Phosphate"]),
    ("Magnesium", &["Magnesium", "Mg", "MG"]),
    ("Total Protein", &["Total Protein", "TP", "Protein Total"]),
    ("Albumin", &["Albumin", "ALB", "Alb"]),
    ("Globulin", &["Globulin", "GLOB", "Glob"]),
    ("A/G Ratio", &["A/G Ratio", "Albumin Globulin Ratio", "AG Ratio"]),
    ("Bilirubin Total", &["Bilirubin Total", "Total Bilirubin", "T Bil", "TBIL"]),
    ("Bilirubin Direct", &["Bilirubin Direct", "Direct Bilirubin", "D Bil", "DBIL"]),
    ("ALT", &["ALT", "SGPT", "Alanine Aminotransferase"]),
    ("AST", &["AST", "SGOT", "Aspartate Aminotransferase"]),
    ("ALP", &["ALP", "Alkaline Phosphatase", "Alk Phos"]),
    ("GGT", &["GGT", "Gamma GT", "Gamma Glutamyl Transferase"]),
    ("LDH", &["LDH", "Lactate Dehydrogenase"]),
    ("Total Cholesterol", &["Total Cholesterol", "Cholesterol", "CHOL", "TC"]),
    ("HDL", &["HDL", "HDL Cholesterol", "Good Cholesterol"]),
    ("LDL", &["LDL", "LDL Cholesterol", "Bad Cholesterol"]),
    ("Triglycerides", &["Triglycerides", "TG", "TRIG"]),
    ("TSH", &["TSH", "Thyroid Stimulating Hormone"]),
    ("T3", &["T3", "Triiodothyronine", "Total T3"]),
    ("T4", &["T4", "Thyroxine", "Total T4"]),
    ("Free T4", &["Free T4", "FT4", "T4 Free"]),
    ("Free T3", &["Free T3", "FT3", "T3 Free"]),
    ("Iron", &["Iron", "Fe", "Serum Iron"]),
    ("Ferritin", &["Ferritin", "Ferr"]),
    ("TIBC", &["TIBC", "Total Iron Binding Capacity"]),
    ("Transferrin Saturation", &["Transferrin Saturation", "TSAT", "Iron Saturation"]),
    ("Vitamin D", &["Vitamin D", "25-OH Vitamin D", "25(OH)D", "Vit D"]),
    ("Vitamin B12", &["Vitamin B12", "B12", "Cobalamin", "Vit B12"]),
    ("Folate", &["Folate", "Folic Acid", "B9"]),
    ("CRP", &["CRP", "C-Reactive Protein", "C Reactive Protein"]),
    ("ESR", &["ESR", "Erythrocyte Sedimentation Rate", "Sed Rate"]),
    ("PSA", &["PSA", "Prostate Specific Antigen"]),
    ("Testosterone", &["Testosterone", "Total Testosterone", "Test"]),
    ("Estradiol", &["Estradiol", "E2", "Estrogen"]),
    ("Progesterone", &["Progesterone", "Prog"]),
    ("Cortisol", &["Cortisol", "Hydrocortisone"]),
    ("Insulin", &["Insulin", "INS"]),
    ("C-Peptide", &["C-Peptide", "C Peptide"]),
    ("Uric Acid", &["Uric Acid", "UA", "Urate"]),
    ("Lactate", &["Lactate", "Lactic Acid"]),
    ("Ammonia", &["Ammonia", "NH3"]),
    ("Troponin I", &["Troponin I", "TnI", "cTnI"]),
    ("BNP", &["BNP", "B-type Natriuretic Peptide"]),
    ("PT", &["PT", "Prothrombin Time"]),
    ("PTT", &["PTT", "Partial Thromboplastin Time", "aPTT"]),
    ("INR", &["INR", "International Normalized Ratio"]),
    ("D-Dimer", &["D-Dimer", "D Dimer"]),
    ("Fibrinogen", &["Fibrinogen", "Fibr"]),
];

/// Maps canonical test names to the textual variants that may appear in a report.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    variants: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn builtin() -> Self {
        let variants = BUILTIN_ALIASES
            .iter()
            .map(|(name, aliases)| {
                (
                    name.to_string(),
                    aliases.iter().map(|alias| alias.to_string()).collect(),
                )
            })
            .collect();
        Self { variants }
    }

    /// Register or replace the variants for one canonical name.
    pub fn with_aliases<I, S>(mut self, canonical: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants.insert(
            canonical.to_string(),
            aliases.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Variants to search for, falling back to the canonical name alone.
    pub fn aliases_for<'a>(&'a self, canonical: &'a str) -> Vec<&'a str> {
        match self.variants.get(canonical) {
            Some(aliases) if !aliases.is_empty() => {
                aliases.iter().map(String::as_str).collect()
            }
            _ => vec![canonical],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_name_lists_variants_in_order() {
        let table = AliasTable::builtin();
        assert_eq!(table.aliases_for("Glucose"), vec!["Glucose", "GLU", "Blood Sugar", "BS"]);
    }

    #[test]
    fn unknown_name_falls_back_to_itself() {
        let table = AliasTable::builtin();
        assert_eq!(table.aliases_for("Zinc"), vec!["Zinc"]);
    }

    #[test]
    fn custom_aliases_replace_builtin() {
        let table = AliasTable::builtin().with_aliases("Glucose", ["FBG"]);
        assert_eq!(table.aliases_for("Glucose"), vec!["FBG"]);
    }

    #[test]
    fn empty_registration_still_falls_back() {
        let table = AliasTable::default().with_aliases("Zinc", Vec::<String>::new());
        assert_eq!(table.aliases_for("Zinc"), vec!["Zinc"]);
    }
}
