//! Static lookup tables: reward store, avatars, promo codes, quest templates.

use crate::state::ItemKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u64,
    pub available: bool,
    /// Inventory item granted on purchase. `None` for cosmetic entries.
    pub grants: Option<ItemKind>,
}

pub static STORE_ITEMS: [StoreItem; 4] = [
    StoreItem {
        id: "streak_saver",
        name: "Streak Saver Token",
        description: "Absorbs one missed day or week without breaking the streak.",
        price: 50,
        available: true,
        grants: Some(ItemKind::StreakSaver),
    },
    StoreItem {
        id: "xp_multiplier",
        name: "XP Multiplier",
        description: "2x XP on quest rewards for 2 hours.",
        price: 75,
        available: true,
        grants: Some(ItemKind::XpMultiplier),
    },
    StoreItem {
        id: "theme_ocean",
        name: "Ocean Blue Theme",
        description: "Ocean colors for the dashboard.",
        price: 100,
        available: false,
        grants: None,
    },
    StoreItem {
        id: "avatar_pack",
        name: "Avatar Cosmetics",
        description: "Premium avatars and customization options.",
        price: 150,
        available: false,
        grants: None,
    },
];

pub fn store_item(id: &str) -> Option<&'static StoreItem> {
    let id = id.trim();
    STORE_ITEMS.iter().find(|item| item.id.eq_ignore_ascii_case(id))
}

/// How an avatar becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarUnlock {
    /// Always available.
    Free,
    /// Bought once with coins.
    Price(u64),
    /// Granted by reaching a streak milestone; never sold.
    Milestone(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avatar {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub category: &'static str,
    pub unlock: AvatarUnlock,
}

const fn free(id: &'static str, emoji: &'static str, name: &'static str) -> Avatar {
    Avatar {
        id,
        name,
        emoji,
        category: "Free",
        unlock: AvatarUnlock::Free,
    }
}

const fn paid(
    id: &'static str,
    emoji: &'static str,
    name: &'static str,
    category: &'static str,
    price: u64,
) -> Avatar {
    Avatar {
        id,
        name,
        emoji,
        category,
        unlock: AvatarUnlock::Price(price),
    }
}

/// Avatar shown when none is selected.
pub const DEFAULT_AVATAR: &str = "professional-person";

/// Free avatars first, then paid ones by price, then milestone rewards.
pub static AVATARS: [Avatar; 23] = [
    free("professional-person", "\u{1f9d1}\u{200d}\u{1f4bc}", "Professional"),
    free("professional-woman", "\u{1f469}\u{200d}\u{1f4bc}", "Professional Woman"),
    free("person-pouting", "\u{1f64e}", "Person"),
    free("man-pouting", "\u{1f64e}\u{200d}\u{2642}\u{fe0f}", "Man"),
    free("woman-pouting", "\u{1f64e}\u{200d}\u{2640}\u{fe0f}", "Woman"),
    free("person-headscarf", "\u{1f9d5}", "Person with Headscarf"),
    free("male-teacher", "\u{1f468}\u{200d}\u{1f3eb}", "Teacher"),
    free("female-teacher", "\u{1f469}\u{200d}\u{1f3eb}", "Teacher Woman"),
    paid("troll", "\u{1f9cc}", "Troll", "Troll", 5),
    paid("vampire-male", "\u{1f9db}\u{200d}\u{2642}\u{fe0f}", "Vampire", "Vampire", 10),
    paid("vampire-female", "\u{1f9db}\u{200d}\u{2640}\u{fe0f}", "Vampire Woman", "Vampire", 10),
    paid("prince", "\u{1f934}", "Prince", "Royal", 10),
    paid("princess", "\u{1f478}", "Princess", "Royal", 10),
    paid("superhero-male", "\u{1f9b8}\u{200d}\u{2642}\u{fe0f}", "Superhero", "Superhero", 10),
    paid("superhero-female", "\u{1f9b8}\u{200d}\u{2640}\u{fe0f}", "Superhero Woman", "Superhero", 10),
    paid("fairy", "\u{1f9da}\u{200d}\u{2640}\u{fe0f}", "Fairy", "Fairy", 10),
    paid("zombie-male", "\u{1f9df}", "Zombie", "Zombie", 10),
    paid("zombie-female", "\u{1f9df}\u{200d}\u{2640}\u{fe0f}", "Zombie Woman", "Zombie", 10),
    paid("levitating-male", "\u{1f9d8}\u{200d}\u{2642}\u{fe0f}", "Levitating", "Levitating", 15),
    paid("levitating-female", "\u{1f9d8}\u{200d}\u{2640}\u{fe0f}", "Levitating Woman", "Levitating", 15),
    paid("ninja", "\u{1f977}", "Ninja", "Ninja", 45),
    paid("mage", "\u{1f9d9}\u{200d}\u{2642}\u{fe0f}", "Mage", "Mage", 50),
    Avatar {
        id: "phoenix",
        name: "Phoenix",
        emoji: "\u{1f426}\u{200d}\u{1f525}",
        category: "Legendary",
        unlock: AvatarUnlock::Milestone(100),
    },
];

pub fn avatar(id: &str) -> Option<&'static Avatar> {
    let id = id.trim();
    AVATARS.iter().find(|a| a.id.eq_ignore_ascii_case(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoReward {
    Xp(u64),
    Coins(u64),
    Item(ItemKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoCode {
    pub code: &'static str,
    pub reward: PromoReward,
    pub description: &'static str,
    pub reusable: bool,
}

pub static PROMO_CODES: [PromoCode; 1] = [PromoCode {
    code: "TESTXP150",
    reward: PromoReward::Xp(150),
    description: "+150 XP",
    reusable: true,
}];

/// Canonical form of a user-entered code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn promo_code(code: &str) -> Option<&'static PromoCode> {
    let code = normalize_code(code);
    PROMO_CODES.iter().find(|p| p.code == code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestTemplate {
    pub category: &'static str,
    pub text: &'static str,
    pub xp: u64,
}

const fn template(category: &'static str, text: &'static str, xp: u64) -> QuestTemplate {
    QuestTemplate { category, text, xp }
}

/// Daily quest suggestions grouped by life area.
pub static DAILY_TEMPLATES: [QuestTemplate; 25] = [
    template("health", "Exercise 30 min", 10),
    template("health", "Go for a walk", 5),
    template("health", "Meditate 10 min", 5),
    template("health", "Drink 8 glasses of water", 5),
    template("health", "Eat healthy meal", 5),
    template("health", "Sleep 8 hours", 10),
    template("work", "Complete top priority task", 15),
    template("work", "Clear email inbox", 10),
    template("work", "Plan tomorrow", 5),
    template("work", "Clean workspace", 5),
    template("work", "Review daily goals", 5),
    template("learning", "Read 20 pages", 10),
    template("learning", "Language practice 15 min", 10),
    template("learning", "Study 30 min", 10),
    template("learning", "Watch educational video", 5),
    template("learning", "Learn something new", 10),
    template("wellness", "Journal 10 min", 5),
    template("wellness", "Gratitude practice", 5),
    template("wellness", "No social media before noon", 10),
    template("wellness", "Phone-free hour", 10),
    template("wellness", "Morning routine", 10),
    template("personal", "Make bed", 5),
    template("personal", "Tidy living space", 5),
    template("personal", "Cook a meal", 10),
    template("personal", "Call family/friend", 10),
];

pub fn daily_templates(category: &str) -> impl Iterator<Item = &'static QuestTemplate> + '_ {
    DAILY_TEMPLATES
        .iter()
        .filter(move |t| t.category.eq_ignore_ascii_case(category))
}

/// Template whose text matches `text`, ignoring case and surrounding space.
pub fn template_for(text: &str) -> Option<&'static QuestTemplate> {
    let text = text.trim();
    DAILY_TEMPLATES.iter().find(|t| t.text.eq_ignore_ascii_case(text))
}
