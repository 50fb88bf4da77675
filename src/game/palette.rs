//! Couleurs et mots du jeu

/// Couleurs d'affichage, dans l'ordre des labels du modèle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// Toutes les couleurs, ordre de scan du classifieur
    pub const ALL: [Color; 7] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Label de la classe correspondante dans le modèle
    pub fn label(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Magenta => "magenta",
            Color::Cyan => "cyan",
            Color::White => "white",
        }
    }

    /// Nom affiché à l'écran
    pub fn display_name(self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
            Color::Yellow => "YELLOW",
            Color::Magenta => "MAGENTA",
            Color::Cyan => "CYAN",
            Color::White => "WHITE",
        }
    }

    /// Retrouve une couleur depuis un label du modèle
    ///
    /// Accepte aussi les labels préfixés par leur index (`00_red`).
    pub fn from_label(label: &str) -> Option<Self> {
        let name = label
            .split_once('_')
            .filter(|(prefix, _)| prefix.chars().all(|c| c.is_ascii_digit()))
            .map_or(label, |(_, name)| name);
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(name))
    }
}

/// Mots affichés, triés par longueur
///
/// Différents des couleurs : BLACK n'est pas une couleur jouable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word {
    pub text: &'static str,
    /// Abscisse du curseur pour centrer le mot en taille 10
    pub cursor_x: i32,
}

pub const WORDS: [Word; 8] = [
    Word { text: "RED", cursor_x: 200 },
    Word { text: "BLUE", cursor_x: 150 },
    Word { text: "CYAN", cursor_x: 150 },
    Word { text: "GREEN", cursor_x: 120 },
    Word { text: "BLACK", cursor_x: 120 },
    Word { text: "WHITE", cursor_x: 120 },
    Word { text: "YELLOW", cursor_x: 100 },
    Word { text: "MAGENTA", cursor_x: 90 },
];

/// Ordonnée du mot affiché
pub const WORD_CURSOR_Y: i32 = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_label() {
        for color in Color::ALL {
            assert_eq!(Color::from_label(color.label()), Some(color));
        }
        assert_eq!(Color::from_label("02_BLUE"), Some(Color::Blue));
        assert_eq!(Color::from_label("black"), None);
        assert_eq!(Color::from_label("noise"), None);
        assert_eq!(Color::from_label("x_red"), None);
    }

    #[test]
    fn words_are_sorted_by_length_and_shift_left_as_they_grow() {
        for pair in WORDS.windows(2) {
            assert!(pair[0].text.len() <= pair[1].text.len());
            assert!(pair[0].cursor_x >= pair[1].cursor_x);
        }
        assert!(WORDS.iter().any(|w| w.text == "BLACK"));
    }
}
