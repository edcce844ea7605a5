//! French department and region utilities.
//!
//! Maps INSEE department codes (`"01"`..`"95"`, `"2A"`, `"2B"`, and the
//! three-digit overseas codes) to their administrative region, and derives
//! a department code from a five-character commune code.

/// Region name returned for codes that do not belong to a known department.
pub const UNKNOWN_REGION: &str = "Autre";

/// The thirteen metropolitan regions plus the five overseas regions.
pub const REGIONS: &[&str] = &[
    "Auvergne-Rhône-Alpes",
    "Bourgogne-Franche-Comté",
    "Bretagne",
    "Centre-Val de Loire",
    "Corse",
    "Grand Est",
    "Hauts-de-France",
    "Île-de-France",
    "Normandie",
    "Nouvelle-Aquitaine",
    "Occitanie",
    "Pays de la Loire",
    "Provence-Alpes-Côte d'Azur",
    "Guadeloupe",
    "Martinique",
    "Guyane",
    "La Réunion",
    "Mayotte",
];

/// Maps a department code to its region name.
///
/// Single-digit codes are left-padded (`"1"` is treated as `"01"`).
/// Returns [`UNKNOWN_REGION`] for unrecognized codes.
#[must_use]
pub fn region_for_department(department: &str) -> &'static str {
    let trimmed = department.trim();
    let padded;
    let code = if trimmed.len() == 1 {
        padded = format!("0{trimmed}");
        padded.as_str()
    } else {
        trimmed
    };

    match code.to_ascii_uppercase().as_str() {
        "01" | "03" | "07" | "15" | "26" | "38" | "42" | "43" | "63" | "69" | "73" | "74" => {
            "Auvergne-Rhône-Alpes"
        }
        "21" | "25" | "39" | "58" | "70" | "71" | "89" | "90" => "Bourgogne-Franche-Comté",
        "22" | "29" | "35" | "56" => "Bretagne",
        "18" | "28" | "36" | "37" | "41" | "45" => "Centre-Val de Loire",
        "2A" | "2B" | "20" => "Corse",
        "08" | "10" | "51" | "52" | "54" | "55" | "57" | "67" | "68" | "88" => "Grand Est",
        "02" | "59" | "60" | "62" | "80" => "Hauts-de-France",
        "75" | "77" | "78" | "91" | "92" | "93" | "94" | "95" => "Île-de-France",
        "14" | "27" | "50" | "61" | "76" => "Normandie",
        "16" | "17" | "19" | "23" | "24" | "33" | "40" | "47" | "64" | "79" | "86" | "87" => {
            "Nouvelle-Aquitaine"
        }
        "09" | "11" | "12" | "30" | "31" | "32" | "34" | "46" | "48" | "65" | "66" | "81"
        | "82" => "Occitanie",
        "44" | "49" | "53" | "72" | "85" => "Pays de la Loire",
        "04" | "05" | "06" | "13" | "83" | "84" => "Provence-Alpes-Côte d'Azur",
        "971" => "Guadeloupe",
        "972" => "Martinique",
        "973" => "Guyane",
        "974" => "La Réunion",
        "976" => "Mayotte",
        _ => UNKNOWN_REGION,
    }
}

/// Derives the department code from an INSEE commune code.
///
/// Overseas communes (`97xxx`, `98xxx`) use a three-character department
/// code; everything else uses the first two characters (including the
/// Corsican `2A`/`2B`).
#[must_use]
pub fn department_from_code(code: &str) -> Option<&str> {
    let code = code.trim();
    if !code.is_ascii() {
        return None;
    }
    if (code.starts_with("97") || code.starts_with("98")) && code.len() >= 3 {
        Some(&code[..3])
    } else if code.len() >= 2 {
        Some(&code[..2])
    } else {
        None
    }
}
