/// English display name for an ISO 3166-1 alpha-2 country code.
/// Unknown codes fall back to the code itself.
pub fn country_display_name(code: &str) -> &str {
    match code {
        "CN" => "China",
        "HK" => "Hong Kong",
        "MO" => "Macau",
        "TW" => "Taiwan",
        "US" => "United States",
        "GB" => "United Kingdom",
        "DE" => "Germany",
        "FR" => "France",
        "JP" => "Japan",
        "KR" => "South Korea",
        "SG" => "Singapore",
        "AU" => "Australia",
        "CA" => "Canada",
        other => other,
    }
}
