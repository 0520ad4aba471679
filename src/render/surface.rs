use super::card::Card;
use crate::core::{RecordId, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Where cards are shown. Cards are listed top to bottom.
pub trait DisplaySurface: Send + Sync {
    /// Put a card above all others
    fn insert_front(&self, card: Card) -> Result<()>;

    /// Remove the card for `id`; false if no such card is shown
    fn remove(&self, id: RecordId) -> Result<bool>;

    /// Cards currently shown, top first
    fn cards(&self) -> Result<Vec<Card>>;
}

/// In-memory display list. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct CardList {
    cards: Arc<Mutex<VecDeque<Card>>>,
}

impl CardList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities of the shown cards, top first
    pub fn ids(&self) -> Result<Vec<RecordId>> {
        Ok(self.cards.lock()?.iter().map(Card::id).collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.cards.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.cards.lock()?.is_empty())
    }
}

impl DisplaySurface for CardList {
    fn insert_front(&self, card: Card) -> Result<()> {
        self.cards.lock()?.push_front(card);
        Ok(())
    }

    fn remove(&self, id: RecordId) -> Result<bool> {
        let mut cards = self.cards.lock()?;
        match cards.iter().position(|card| card.id() == id) {
            Some(index) => {
                cards.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn cards(&self) -> Result<Vec<Card>> {
        Ok(self.cards.lock()?.iter().cloned().collect())
    }
}

impl std::fmt::Display for CardList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self.cards.lock().map_err(|_| std::fmt::Error)?;
        for (index, card) in cards.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", card)?;
        }
        Ok(())
    }
}
