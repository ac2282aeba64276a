//! Built-in tables used when no mapping files are available.

use crate::mapping::dictionary::TagDictionary;

pub const DEFAULT_STYLE: &str = "清新简洁";
pub const ANIME_STYLE: &str = "日系动漫";

const DEFAULT_TAG_MAPPINGS: &[(&str, &str)] = &[
    // emotions
    ("悲伤", "crying, tears, sad expression, gloomy atmosphere, rainy background"),
    ("开心", "smile, happy, laughing, bright eyes, sparkles"),
    ("愤怒", "angry, veins pop, shouting, aggressive pose, fire background"),
    ("惊讶", "surprised, open mouth, wide eyes, shock lines"),
    ("绝望", "despair, empty eyes, dark background, shadow over face"),
    // scenes
    ("学校", "classroom, school desk, chalkboard, school uniform, sunlight through window"),
    ("医院", "hospital room, medical equipment, white bed, clinical atmosphere"),
    ("家", "living room, cozy, indoor, furniture, sofa"),
    ("街道", "city street, outdoors, buildings, crowd, traffic"),
    ("办公室", "office, desk, computer, documents, business suit"),
    // people and concepts
    ("巨婴", "immature adult, childish behavior, holding toys, messy, tantrum"),
    ("离婚", "broken ring, divorce papers, separate, arguing, back to back"),
    ("钱", "holding money, cash, rich, currency, bank notes"),
    ("补偿", "stack of money, transaction, handshake, business deal"),
    ("家务", "cleaning, apron, vacuum cleaner, washing dishes"),
    ("孩子", "child, baby, playing, toys, cute"),
];

const DEFAULT_STYLES: &[(&str, &str)] = &[
    (
        "清新简洁",
        "masterpiece, best quality, flat color, anime style, simple background, bright",
    ),
    (
        "赛博朋克",
        "cyberpunk, neon lights, sci-fi, futuristic, dark atmosphere, glowing",
    ),
    (
        "黑白线稿",
        "monochrome, lineart, manga style, ink, sketch, screentones",
    ),
    (
        "鲜艳活泼",
        "vibrant colors, energetic, dynamic angle, highly detailed, saturation high",
    ),
    (
        "水墨古风",
        "chinese traditional ink painting, watercolor, calligraphy brush, mountain landscape",
    ),
    (
        "日系动漫",
        "anime key visual, cel shaded, vibrant colors, manga style, japanese animation aesthetic, detailed lineart",
    ),
];

pub fn default_tag_mappings() -> TagDictionary {
    TagDictionary::from_pairs(DEFAULT_TAG_MAPPINGS.iter().copied())
}

pub fn default_styles() -> TagDictionary {
    TagDictionary::from_pairs(DEFAULT_STYLES.iter().copied())
}
