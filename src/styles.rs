//! The closed set of jean styles the classifier knows about.
//!
//! Declaration order is the model's output order: index `i` of a prediction
//! vector scores `StyleLabel::ALL[i]`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleLabel {
    Baggy,
    Bootcut,
    Skinny,
    Straight,
    WideLeg,
}

/// Static presentation record for one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleDescriptor {
    pub description: &'static str,
    pub trending_years: &'static str,
    /// Path relative to the asset root, e.g. `dino_pics/dino_skinny.png`.
    pub illustration: &'static str,
}

impl StyleLabel {
    pub const ALL: [StyleLabel; 5] = [
        StyleLabel::Baggy,
        StyleLabel::Bootcut,
        StyleLabel::Skinny,
        StyleLabel::Straight,
        StyleLabel::WideLeg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleLabel::Baggy    => "Baggy",
            StyleLabel::Bootcut  => "Bootcut",
            StyleLabel::Skinny   => "Skinny",
            StyleLabel::Straight => "Straight",
            StyleLabel::WideLeg  => "Wide-Leg",
        }
    }

    /// Case-insensitive lookup; spaces, hyphens and underscores are interchangeable.
    pub fn from_name(name: &str) -> Option<StyleLabel> {
        let key: String = name.trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(|c| c.to_lowercase())
            .collect();
        StyleLabel::ALL.iter().copied().find(|label| {
            let own: String = label.name().chars()
                .filter(|&c| c != '-')
                .flat_map(|c| c.to_lowercase())
                .collect();
            own == key
        })
    }

    pub fn descriptor(self) -> &'static StyleDescriptor {
        match self {
            StyleLabel::Skinny => &StyleDescriptor {
                description: "Tight-fitting and sleek, perfect for the 2010s aesthetic.",
                trending_years: "2005–2018",
                illustration: "dino_pics/dino_skinny.png",
            },
            StyleLabel::Bootcut => &StyleDescriptor {
                description: "A 90s classic with a flare at the bottom for boots.",
                trending_years: "1995–2005",
                illustration: "dino_pics/dino_bootcut.png",
            },
            StyleLabel::Baggy => &StyleDescriptor {
                description: "Roomy and rebellious, born from 90s skater culture.",
                trending_years: "1990s–early 2000s, resurged in 2020s",
                illustration: "dino_pics/dino_baggy.png",
            },
            StyleLabel::WideLeg => &StyleDescriptor {
                description: "Free-flowing and bold: a favorite for comfort and flair.",
                trending_years: "1970s, resurged post-2018",
                illustration: "dino_pics/dino_wide.png",
            },
            StyleLabel::Straight => &StyleDescriptor {
                description: "Simple, classic, and effortlessly cool, straight through the leg.",
                trending_years: "Forever in style",
                illustration: "dino_pics/dino_straight.png",
            },
        }
    }

    /// The built-in label list in model output order, as owned strings.
    pub fn default_labels() -> Vec<String> {
        StyleLabel::ALL.iter().map(|l| l.name().to_owned()).collect()
    }
}

impl fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
