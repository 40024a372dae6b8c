//! Static farming content: jokes, trivia, "would you rather" prompts and
//! keyword emoji reactions.

use rand::prelude::IndexedRandom;

const JOKES: [&str; 8] = [
    "😂 Why do cows have hooves instead of feet? Because they lactose!",
    "🌾 Why did the scarecrow win an award? Because he was outstanding in his field!",
    "🌴 What kind of tree fits in your hand? A palm tree!",
    "🐔 Why don't farmers tell chicken jokes? Because they would be poultry in motion!",
    "🌽 What do you call a grumpy farmer? A snap pea!",
    "🥕 Why did the farmer bury his money? To make his soil rich!",
    "🍅 What's a tomato's favorite game? Squash!",
    "🐄 What do you call a cow with no legs? Ground beef!",
];

/// A multiple-choice question; `answer` is always one of `options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub answer: &'static str,
}

const TRIVIA: [Trivia; 8] = [
    Trivia {
        question: "What process do plants use to make food using sunlight?",
        options: &["Respiration", "Photosynthesis", "Transpiration", "Germination"],
        answer: "Photosynthesis",
    },
    Trivia {
        question: "Which nutrient is most essential for plant growth and green color?",
        options: &["Phosphorus", "Potassium", "Nitrogen", "Calcium"],
        answer: "Nitrogen",
    },
    Trivia {
        question: "What is the ideal pH range for most crops?",
        options: &["4.0-5.0", "6.0-7.0", "8.0-9.0", "9.0-10.0"],
        answer: "6.0-7.0",
    },
    Trivia {
        question: "Which farming practice helps prevent soil erosion?",
        options: &["Monoculture", "Contour plowing", "Deep tillage", "Bare fallowing"],
        answer: "Contour plowing",
    },
    Trivia {
        question: "What does NPK stand for in fertilizers?",
        options: &[
            "Nitrogen, Phosphorus, Potassium",
            "Nitrate, Phosphate, Potash",
            "Natural Plant Killer",
            "New Plant Knowledge",
        ],
        answer: "Nitrogen, Phosphorus, Potassium",
    },
    Trivia {
        question: "What is the primary gas that plants absorb during photosynthesis?",
        options: &["Oxygen", "Carbon Dioxide", "Nitrogen", "Hydrogen"],
        answer: "Carbon Dioxide",
    },
    Trivia {
        question: "Which part of the plant is responsible for absorbing water?",
        options: &["Leaves", "Stem", "Roots", "Flowers"],
        answer: "Roots",
    },
    Trivia {
        question: "Which crop family fixes nitrogen in the soil?",
        options: &["Grasses", "Legumes", "Brassicas", "Nightshades"],
        answer: "Legumes",
    },
];

const WOULD_YOU_RATHER: [&str; 8] = [
    "Would you rather have a pet cow 🐄 or a pet chicken 🐔?",
    "Would you rather plant a tree 🌳 or grow a vegetable garden 🥕?",
    "Would you rather grow rice 🌾 or grow wheat?",
    "Would you rather have a farm in the mountains 🏔️ or by the sea 🌊?",
    "Would you rather grow organic vegetables 🥬 or beautiful flowers 🌺?",
    "Would you rather have a tractor 🚜 or a greenhouse 🏠?",
    "Would you rather grow bananas 🍌 or mangoes 🥭?",
    "Would you rather raise goats 🐐 or sheep 🐑?",
];

const EMOJI_REACTIONS: [(&str, &str); 21] = [
    ("happy", "😊"),
    ("sad", "😢"),
    ("angry", "😡"),
    ("love", "❤️"),
    ("plant", "🌱"),
    ("harvest", "🌾"),
    ("farm", "🚜"),
    ("crop", "🌽"),
    ("water", "💧"),
    ("sun", "☀️"),
    ("rain", "🌧️"),
    ("soil", "🪨"),
    ("seed", "🌱"),
    ("flower", "🌸"),
    ("fruit", "🍎"),
    ("vegetable", "🥕"),
    ("cow", "🐄"),
    ("chicken", "🐔"),
    ("pig", "🐷"),
    ("goat", "🐐"),
    ("sheep", "🐑"),
];

#[must_use]
pub fn random_joke() -> &'static str {
    JOKES.choose(&mut rand::rng()).copied().unwrap_or(JOKES[0])
}

#[must_use]
pub fn random_trivia() -> Trivia {
    TRIVIA.choose(&mut rand::rng()).copied().unwrap_or(TRIVIA[0])
}

#[must_use]
pub fn random_would_you_rather() -> &'static str {
    WOULD_YOU_RATHER
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(WOULD_YOU_RATHER[0])
}

/// Emoji for the first reaction keyword found in `text`, in table order.
#[must_use]
pub fn emoji_reaction(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    EMOJI_REACTIONS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, emoji)| *emoji)
}

impl Trivia {
    /// Question with numbered options and the answer hidden in a spoiler.
    #[must_use]
    pub fn render(&self) -> String {
        let options = self
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}. {option}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "🧠 **Agricultural Trivia:** {}\n\n{options}\n\nAnswer: ||{}|| 🌾",
            self.question, self.answer
        )
    }
}
