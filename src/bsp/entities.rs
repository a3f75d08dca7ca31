//! Text entity lump: a list of `{ "key" "value" ... }` blocks.

use glam::Vec3;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::world::geometry::{Level, y_up};

/// Class names a player may spawn at.
pub const SPAWN_CLASSES: [&str; 2] = ["info_player_start", "info_player_deathmatch"];

/// One entity: its key/value pairs in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    pub pairs: Vec<(String, String)>,
}

impl Entity {
    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn classname(&self) -> Option<&str> {
        self.get("classname")
    }

    /// `"origin"` parsed as three floats, converted to the Y-up convention.
    pub fn origin(&self) -> Option<Vec3> {
        let mut it = self.get("origin")?.split_whitespace().map(str::parse::<f32>);
        let (x, y, z) = (it.next()?.ok()?, it.next()?.ok()?, it.next()?.ok()?);
        Some(y_up(Vec3::new(x, y, z)))
    }

    pub fn is_spawn_point(&self) -> bool {
        self.classname().is_some_and(|c| SPAWN_CLASSES.contains(&c))
    }
}

/// Split the entity lump into its blocks.  Text outside `{ }` is ignored.
pub fn parse_entities(text: &str) -> Vec<Entity> {
    static BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());
    static PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)"\s+"([^"]*)""#).unwrap());

    BLOCK
        .captures_iter(text)
        .map(|block| Entity {
            pairs: PAIR
                .captures_iter(&block[1])
                .map(|kv| (kv[1].to_owned(), kv[2].to_owned()))
                .collect(),
        })
        .collect()
}

impl Level {
    /// Origins of every player spawn entity, in lump order.
    pub fn spawn_points(&self) -> Vec<Vec3> {
        self.entities
            .iter()
            .filter(|e| e.is_spawn_point())
            .filter_map(Entity::origin)
            .collect()
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
