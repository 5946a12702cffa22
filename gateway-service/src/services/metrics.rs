use crate::models::{AuthSourceType, AuthenticationScheme};

pub fn record_auth_source(source_type: AuthSourceType, valid: bool) {
    ::metrics::counter!(
        "apiml_auth_source_total",
        "type" => source_type.as_str(),
        "outcome" => if valid { "valid" } else { "invalid" }
    )
    .increment(1);
}

pub fn record_passticket_generated(applid: &str) {
    ::metrics::counter!(
        "apiml_passticket_generated_total",
        "applid" => applid.to_string()
    )
    .increment(1);
}

pub fn record_command_created(scheme: AuthenticationScheme, cached: bool) {
    ::metrics::counter!(
        "apiml_authentication_command_total",
        "scheme" => scheme.as_str(),
        "cache" => if cached { "hit" } else { "miss" }
    )
    .increment(1);
}
