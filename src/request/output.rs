use crate::catalog::Actor;
use crate::selection::Selection;
use crate::utils::slugify;
use serde::{Deserialize, Serialize};

/// Image formats the rendering service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gif,
    Apng,
    Png,
}

impl OutputFormat {
    pub fn token(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
            OutputFormat::Apng => "apng",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "image/gif",
            OutputFormat::Apng | OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
            OutputFormat::Apng | OutputFormat::Png => "png",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gif" => Ok(OutputFormat::Gif),
            "apng" => Ok(OutputFormat::Apng),
            "png" => Ok(OutputFormat::Png),
            _ => Err(format!("invalid format {:?}, expected gif, apng or png", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Looping output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimatedFormat {
    Gif,
    #[default]
    Apng,
}

impl From<AnimatedFormat> for OutputFormat {
    fn from(format: AnimatedFormat) -> Self {
        match format {
            AnimatedFormat::Gif => OutputFormat::Gif,
            AnimatedFormat::Apng => OutputFormat::Apng,
        }
    }
}

impl TryFrom<OutputFormat> for AnimatedFormat {
    type Error = String;

    fn try_from(format: OutputFormat) -> Result<Self, Self::Error> {
        match format {
            OutputFormat::Gif => Ok(AnimatedFormat::Gif),
            OutputFormat::Apng => Ok(AnimatedFormat::Apng),
            OutputFormat::Png => Err("png is a single-frame format".to_string()),
        }
    }
}

/// What kind of image a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Animated(AnimatedFormat),
    /// Still PNG at the selection's single-frame timestamp
    SingleFrame,
    /// Small still avatar of the current skins
    HeadPreview,
}

impl OutputMode {
    /// Mode implied by the selection's single-frame toggle
    pub fn for_selection(selection: &Selection, animated: AnimatedFormat) -> Self {
        if selection.flags().single_frame {
            OutputMode::SingleFrame
        } else {
            OutputMode::Animated(animated)
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            OutputMode::Animated(format) => (*format).into(),
            OutputMode::SingleFrame | OutputMode::HeadPreview => OutputFormat::Png,
        }
    }
}

/// File name the service suggests for a downloaded render
pub fn download_filename(actor: &Actor, animation: &str, format: OutputFormat) -> String {
    format!("{}-{}.{}", actor.name, slugify(animation), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Scale;
    use std::collections::BTreeSet;

    #[test]
    fn test_format_parse_case_insensitive() {
        assert_eq!("GIF".parse::<OutputFormat>(), Ok(OutputFormat::Gif));
        assert_eq!("apng".parse::<OutputFormat>(), Ok(OutputFormat::Apng));
        assert!("mp4".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_apng_is_served_as_png() {
        assert_eq!(OutputFormat::Apng.mime_type(), "image/png");
        assert_eq!(OutputFormat::Apng.extension(), "png");
        assert_eq!(OutputMode::HeadPreview.format(), OutputFormat::Png);
        assert_eq!(OutputMode::Animated(AnimatedFormat::Gif).format(), OutputFormat::Gif);
    }

    #[test]
    fn test_download_filename() {
        let actor = Actor {
            slug: "follower".to_string(),
            name: "Follower".to_string(),
            category: "None".to_string(),
            default_skins: vec![],
            default_animation: String::new(),
            default_scale: Scale::default(),
            feature_flags: BTreeSet::new(),
        };
        assert_eq!(
            download_filename(&actor, "Idle/LookAround", OutputFormat::Gif),
            "Follower-idle-look-around.gif"
        );
    }
}
