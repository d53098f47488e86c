//! Platform-neutral rich response.

/// Accent colours used by responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedColor {
    Green,
    Red,
    Orange,
    Blue,
}

impl EmbedColor {
    /// 24-bit RGB value.
    pub fn rgb(self) -> u32 {
        match self {
            Self::Green => 0x2ecc71,
            Self::Red => 0xe74c3c,
            Self::Orange => 0xe67e22,
            Self::Blue => 0x3498db,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A titled card with a description and optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: EmbedColor,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: EmbedColor) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// `<#id>` channel mention.
pub fn channel_mention(channel_id: &str) -> String {
    format!("<#{channel_id}>")
}

/// `<@&id>` role mention.
pub fn role_mention(role_id: &str) -> String {
    format!("<@&{role_id}>")
}

/// Render a flag as `Yes`/`No`.
pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}
