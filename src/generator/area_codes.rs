//! Registry of area codes numbers are drawn from.
//!
//! A sample of US geographic NANP codes. Membership is the only guarantee;
//! real-world assignment is not implied.

#[rustfmt::skip]
const VALID_AREA_CODES: [&str; 72] = [
    "201", "202", "203", "205", "206", "207", "208", "209", "210",
    "212", "213", "214", "215", "216", "217", "218", "219", "220",
    "224", "225", "227", "228", "229", "231", "234", "239", "240",
    "248", "251", "252", "253", "254", "256", "260", "262", "267",
    "269", "270", "272", "276", "281", "283", "301", "302", "303",
    "304", "305", "307", "308", "309", "310", "312", "313", "314",
    "315", "316", "317", "318", "319", "320", "321", "323", "325",
    "327", "330", "331", "334", "336", "337", "339", "340", "341",
];

/// All area codes the generator may emit, in registry order.
pub fn valid_area_codes() -> &'static [&'static str] {
    &VALID_AREA_CODES
}

/// Returns true if `code` is in the registry.
pub fn is_valid_area_code(code: &str) -> bool {
    VALID_AREA_CODES.contains(&code)
}
