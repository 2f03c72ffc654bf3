use poem_openapi::Object;

fn default_is_html() -> bool {
    true
}

#[derive(Object, Debug)]
pub struct SendEmailRequestDto {
    /// Semicolon-separated recipient addresses.
    #[oai(validator(min_length = 1))]
    pub to: String,
    #[oai(validator(min_length = 1))]
    pub subject: String,
    #[oai(validator(min_length = 1))]
    pub body: String,
    #[oai(default = "default_is_html")]
    pub is_html: bool,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}
