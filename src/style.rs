// src/style.rs
use crate::errors::RestyleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DESCRIPTION_PLACEHOLDER: &str = "A [adjective, e.g., vibrant, moody, dreamy] scene with a focus on [element, e.g., ethereal lighting, rich textures].";
pub const INFLUENCE_PLACEHOLDER: &str = "e.g., Van Gogh, Cyberpunk";

fn normalize(value: &str) -> String {
    value.trim().to_lowercase().replace(['_', '-'], " ")
}

/// Declares a closed style domain: the enum, its wire strings, `ALL`,
/// `Display` and a lenient `FromStr`.
macro_rules! style_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RestyleError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(value);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == wanted)
                    .ok_or_else(|| {
                        RestyleError::Validation(format!(
                            "'{}' is not a valid {}; expected one of: {}",
                            value.trim(),
                            $label,
                            $name::ALL
                                .iter()
                                .map(|v| v.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    })
            }
        }
    };
}

style_enum!(
    /// How strongly the style overrides the source photo.
    Intensity, "intensity" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

style_enum!(LightingMood, "lighting mood" {
    SoftDaylight => "soft daylight",
    CinematicShadows => "cinematic shadows",
    NeonNight => "neon night",
    GoldenHour => "golden hour",
});

style_enum!(ColorTone, "color tone" {
    Warm => "warm",
    Cool => "cool",
    Pastel => "pastel",
    Vivid => "vivid",
    Desaturated => "desaturated",
});

style_enum!(TextureStyle, "texture style" {
    Smooth => "smooth",
    Watercolor => "watercolor",
    OilPainting => "oil painting",
    Sketch => "sketch",
    DigitalArt => "digital art",
});

/// Complete description of a requested restyle. Every field is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    pub description: String,
    pub intensity: Intensity,
    pub lighting: LightingMood,
    pub color: ColorTone,
    pub texture: TextureStyle,
    pub influence: String,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            description: "A dreamy, ethereal scene with a focus on soft, glowing light.".to_string(),
            intensity: Intensity::Medium,
            lighting: LightingMood::SoftDaylight,
            color: ColorTone::Pastel,
            texture: TextureStyle::DigitalArt,
            influence: "Studio Ghibli".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleField {
    Description,
    Intensity,
    Lighting,
    Color,
    Texture,
    Influence,
}

impl FromStr for StyleField {
    type Err = RestyleError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key.trim().to_lowercase().as_str() {
            "description" => Ok(StyleField::Description),
            "intensity" => Ok(StyleField::Intensity),
            "lighting" => Ok(StyleField::Lighting),
            "color" => Ok(StyleField::Color),
            "texture" => Ok(StyleField::Texture),
            "influence" => Ok(StyleField::Influence),
            other => Err(RestyleError::Validation(format!(
                "Unknown style field '{}'",
                other
            ))),
        }
    }
}

/// A single-field replacement with a value already checked against its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleEdit {
    Description(String),
    Intensity(Intensity),
    Lighting(LightingMood),
    Color(ColorTone),
    Texture(TextureStyle),
    Influence(String),
}

impl StyleEdit {
    pub fn parse(field: StyleField, value: &str) -> Result<Self, RestyleError> {
        Ok(match field {
            StyleField::Description => StyleEdit::Description(value.to_string()),
            StyleField::Intensity => StyleEdit::Intensity(value.parse()?),
            StyleField::Lighting => StyleEdit::Lighting(value.parse()?),
            StyleField::Color => StyleEdit::Color(value.parse()?),
            StyleField::Texture => StyleEdit::Texture(value.parse()?),
            StyleField::Influence => StyleEdit::Influence(value.to_string()),
        })
    }

    pub fn from_key(key: &str, value: &str) -> Result<Self, RestyleError> {
        Self::parse(key.parse()?, value)
    }
}

impl StyleOptions {
    pub fn apply(&mut self, edit: StyleEdit) {
        match edit {
            StyleEdit::Description(text) => self.description = text,
            StyleEdit::Intensity(value) => self.intensity = value,
            StyleEdit::Lighting(value) => self.lighting = value,
            StyleEdit::Color(value) => self.color = value,
            StyleEdit::Texture(value) => self.texture = value,
            StyleEdit::Influence(text) => self.influence = text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub options: StyleOptions,
}

fn preset(
    name: &'static str,
    description: &str,
    intensity: Intensity,
    lighting: LightingMood,
    color: ColorTone,
    texture: TextureStyle,
    influence: &str,
) -> Preset {
    Preset {
        name,
        options: StyleOptions {
            description: description.to_string(),
            intensity,
            lighting,
            color,
            texture,
            influence: influence.to_string(),
        },
    }
}

pub fn builtin_presets() -> Vec<Preset> {
    use ColorTone as C;
    use Intensity as I;
    use LightingMood as L;
    use TextureStyle as T;

    vec![
        preset(
            "Anime",
            "A vibrant and dynamic anime-style illustration with clean lines, cel shading, and expressive characters.",
            I::High,
            L::SoftDaylight,
            C::Vivid,
            T::DigitalArt,
            "Modern Anime, Makoto Shinkai",
        ),
        preset(
            "Ghibli",
            "A whimsical and heartwarming scene in the style of Studio Ghibli, featuring lush, painted backgrounds, soft lighting, and a nostalgic feel.",
            I::Medium,
            L::SoftDaylight,
            C::Pastel,
            T::Watercolor,
            "Studio Ghibli, Hayao Miyazaki",
        ),
        preset(
            "Pixel Art",
            "A retro 16-bit pixel art scene with a limited color palette and blocky details, reminiscent of classic video games.",
            I::High,
            L::SoftDaylight,
            C::Vivid,
            T::DigitalArt,
            "16-bit video games",
        ),
        preset(
            "Watercolor",
            "A delicate and translucent watercolor painting with soft edges, bleeding colors, and a light, airy feel.",
            I::Medium,
            L::SoftDaylight,
            C::Pastel,
            T::Watercolor,
            "J. M. W. Turner",
        ),
        preset(
            "Calligraphy",
            "An elegant ink wash painting (Sumi-e) with expressive, calligraphic brushstrokes, minimalist composition, and a focus on form and movement.",
            I::High,
            L::CinematicShadows,
            C::Desaturated,
            T::Sketch,
            "Japanese Sumi-e",
        ),
        preset(
            "Oil Painting",
            "A rich and textured oil painting with visible, thick brushstrokes (impasto), deep colors, and a classic, timeless quality.",
            I::Medium,
            L::CinematicShadows,
            C::Warm,
            T::OilPainting,
            "Impressionism, Van Gogh",
        ),
        preset(
            "Sketch",
            "A detailed pencil or charcoal sketch with strong cross-hatching, clear shading, and a focus on form and contour.",
            I::Medium,
            L::SoftDaylight,
            C::Desaturated,
            T::Sketch,
            "Leonardo da Vinci",
        ),
    ]
}

/// Looks a preset up by name, ignoring case and treating `-`/`_` as spaces.
pub fn find_preset(name: &str) -> Result<Preset, RestyleError> {
    let wanted = normalize(name);
    builtin_presets()
        .into_iter()
        .find(|p| p.name.to_lowercase() == wanted)
        .ok_or_else(|| RestyleError::InvalidPreset(name.trim().to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleDomains {
    pub intensity: Vec<&'static str>,
    pub lighting: Vec<&'static str>,
    pub color: Vec<&'static str>,
    pub texture: Vec<&'static str>,
    pub description_placeholder: &'static str,
    pub influence_placeholder: &'static str,
}

pub fn domains() -> StyleDomains {
    StyleDomains {
        intensity: Intensity::ALL.iter().map(|v| v.as_str()).collect(),
        lighting: LightingMood::ALL.iter().map(|v| v.as_str()).collect(),
        color: ColorTone::ALL.iter().map(|v| v.as_str()).collect(),
        texture: TextureStyle::ALL.iter().map(|v| v.as_str()).collect(),
        description_placeholder: DESCRIPTION_PLACEHOLDER,
        influence_placeholder: INFLUENCE_PLACEHOLDER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(options: &mut StyleOptions, key: &str, value: &str) -> Result<(), RestyleError> {
        StyleEdit::from_key(key, value).map(|edit| options.apply(edit))
    }

    #[test]
    fn test_default_is_fully_populated() {
        let options = StyleOptions::default();
        assert_eq!(options.intensity, Intensity::Medium);
        assert_eq!(options.lighting, LightingMood::SoftDaylight);
        assert_eq!(options.color, ColorTone::Pastel);
        assert_eq!(options.texture, TextureStyle::DigitalArt);
        assert_eq!(options.influence, "Studio Ghibli");
        assert!(!options.description.is_empty());
    }

    #[test]
    fn test_edit_replaces_exactly_one_field() {
        let mut options = StyleOptions::default();
        let before = options.clone();

        edit(&mut options, "lighting", "neon night").unwrap();

        assert_eq!(options.lighting, LightingMood::NeonNight);
        assert_eq!(
            StyleOptions {
                lighting: before.lighting,
                ..options.clone()
            },
            before
        );
    }

    #[test]
    fn test_edit_accepts_lenient_spelling() {
        let mut options = StyleOptions::default();
        edit(&mut options, "texture", " Oil_Painting ").unwrap();
        assert_eq!(options.texture, TextureStyle::OilPainting);
        edit(&mut options, "Lighting", "golden-hour").unwrap();
        assert_eq!(options.lighting, LightingMood::GoldenHour);
    }

    #[test]
    fn test_edit_rejects_out_of_domain_value() {
        let mut options = StyleOptions::default();
        let before = options.clone();

        let err = edit(&mut options, "color", "sepia").unwrap_err();

        assert!(matches!(err, RestyleError::Validation(_)));
        assert!(err.user_message().contains("desaturated"));
        assert_eq!(options, before);
    }

    #[test]
    fn test_edit_rejects_unknown_key() {
        let mut options = StyleOptions::default();
        let err = edit(&mut options, "saturation", "high").unwrap_err();
        assert_eq!(
            err,
            RestyleError::Validation("Unknown style field 'saturation'".to_string())
        );
    }

    #[test]
    fn test_free_text_fields_accept_anything() {
        let mut options = StyleOptions::default();
        edit(&mut options, "description", "").unwrap();
        edit(&mut options, "influence", "low").unwrap();
        assert_eq!(options.description, "");
        assert_eq!(options.influence, "low");
    }

    #[test]
    fn test_every_sequence_of_edits_stays_in_domain() {
        let mut options = StyleOptions::default();
        let edits = [
            ("intensity", "high"),
            ("intensity", "extreme"),
            ("lighting", "cinematic shadows"),
            ("color", "cool"),
            ("texture", "crayon"),
            ("texture", "sketch"),
            ("color", ""),
        ];
        for (key, value) in edits {
            let _ = edit(&mut options, key, value);
        }

        assert!(Intensity::ALL.contains(&options.intensity));
        assert!(LightingMood::ALL.contains(&options.lighting));
        assert!(ColorTone::ALL.contains(&options.color));
        assert!(TextureStyle::ALL.contains(&options.texture));
        assert_eq!(options.intensity, Intensity::High);
        assert_eq!(options.texture, TextureStyle::Sketch);
        assert_eq!(options.color, ColorTone::Cool);
    }

    #[test]
    fn test_wire_format_uses_display_strings() {
        let options = builtin_presets()
            .into_iter()
            .find(|p| p.name == "Oil Painting")
            .unwrap()
            .options;
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["texture"], "oil painting");
        assert_eq!(json["lighting"], "cinematic shadows");

        let parsed: StyleOptions = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_find_preset_is_lenient() {
        assert_eq!(find_preset("pixel-art").unwrap().name, "Pixel Art");
        assert_eq!(find_preset("GHIBLI").unwrap().name, "Ghibli");
        assert!(matches!(
            find_preset("Cubism"),
            Err(RestyleError::InvalidPreset(_))
        ));
    }

    #[test]
    fn test_presets_are_distinct_and_named_uniquely() {
        let presets = builtin_presets();
        assert_eq!(presets.len(), 7);
        let mut names: Vec<_> = presets.iter().map(|p| p.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_domains_list_every_value() {
        let d = domains();
        assert_eq!(d.intensity, vec!["low", "medium", "high"]);
        assert_eq!(d.lighting.len(), 4);
        assert_eq!(d.color.len(), 5);
        assert_eq!(d.texture.len(), 5);
    }
}
