use crate::difficulty::Difficulty;
use crate::error::PoolError;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

static POOL_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words/pools");

/// Static word list for one difficulty
#[derive(Deserialize, Clone, Debug)]
pub struct WordPool {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordPool {
    pub fn load(difficulty: Difficulty) -> Result<Self, PoolError> {
        read_pool_from_file(&format!("{}.json", difficulty.as_str()))
    }
}

fn read_pool_from_file(file_name: &str) -> Result<WordPool, PoolError> {
    let file = POOL_DIR
        .get_file(file_name)
        .ok_or_else(|| PoolError::Missing(file_name.to_string()))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| PoolError::Encoding(file_name.to_string()))?;

    let pool: WordPool = from_str(file_as_str)?;
    if pool.words.is_empty() {
        return Err(PoolError::Empty(pool.name));
    }

    Ok(pool)
}

/// All four pools, loaded once
#[derive(Clone, Debug)]
pub struct WordPools {
    easy: WordPool,
    medium: WordPool,
    hard: WordPool,
    alphanumeric: WordPool,
}

impl WordPools {
    pub fn embedded() -> Result<Self, PoolError> {
        Ok(Self {
            easy: WordPool::load(Difficulty::Easy)?,
            medium: WordPool::load(Difficulty::Medium)?,
            hard: WordPool::load(Difficulty::Hard)?,
            alphanumeric: WordPool::load(Difficulty::Alphanumeric)?,
        })
    }

    pub fn get(&self, difficulty: Difficulty) -> &WordPool {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
            Difficulty::Alphanumeric => &self.alphanumeric,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_difficulty_has_a_pool() {
        for d in Difficulty::ALL {
            let pool = WordPool::load(d).unwrap();
            assert_eq!(pool.name, d.as_str());
            assert!(!pool.words.is_empty());
            assert_eq!(pool.size as usize, pool.words.len());
        }
    }

    #[test]
    fn pools_contain_no_blank_or_spaced_words() {
        let pools = WordPools::embedded().unwrap();
        for d in Difficulty::ALL {
            for word in &pools.get(d).words {
                assert!(!word.is_empty());
                assert!(!word.chars().any(char::is_whitespace), "{word:?}");
            }
        }
    }

    #[test]
    fn alphanumeric_pool_mixes_digits() {
        let pool = WordPool::load(Difficulty::Alphanumeric).unwrap();
        assert!(pool
            .words
            .iter()
            .any(|w| w.chars().any(|c| c.is_ascii_digit())));
    }

    #[test]
    fn pool_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "size": 3,
            "words": ["hello", "world", "test"]
        }
        "#;

        let pool: WordPool = from_str(json_data).expect("Failed to deserialize test pool");

        assert_eq!(pool.name, "test");
        assert_eq!(pool.size, 3);
        assert!(pool.words.contains(&"world".to_string()));
    }

    #[test]
    fn missing_pool_file_is_an_error() {
        let result = read_pool_from_file("nonexistent.json");
        assert!(matches!(result, Err(PoolError::Missing(_))));
    }
}
