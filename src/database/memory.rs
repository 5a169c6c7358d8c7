//! In-memory store backed by sharded concurrent maps.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::{Card, NewCard, NewUser, Store, StoreError, StoreResult, User};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// email -> user id; the entry lock here is what makes emails unique.
    emails: DashMap<String, Uuid>,
    /// Cards keyed by id, tagged with an insertion sequence for stable listing.
    cards: DashMap<Uuid, (u64, Card)>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify_user<F>(&self, id: Uuid, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        self.users.get_mut(&id).map(|mut user| {
            f(user.value_mut());
            user.clone()
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        match self.emails.entry(new.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail(new.email)),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    name: new.name,
                    about: new.about,
                    avatar: new.avatar,
                    email: new.email,
                    password_hash: new.password_hash,
                    created_at: Utc::now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_user(id).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, name: &str, about: &str) -> StoreResult<Option<User>> {
        Ok(self.modify_user(id, |user| {
            user.name = name.to_string();
            user.about = about.to_string();
        }))
    }

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> StoreResult<Option<User>> {
        Ok(self.modify_user(id, |user| user.avatar = avatar.to_string()))
    }

    async fn list_cards(&self) -> StoreResult<Vec<Card>> {
        let mut cards: Vec<(u64, Card)> = self.cards.iter().map(|e| e.value().clone()).collect();
        cards.sort_by_key(|(seq, _)| *seq);
        Ok(cards.into_iter().map(|(_, card)| card).collect())
    }

    async fn create_card(&self, new: NewCard) -> StoreResult<Card> {
        let card = Card {
            id: Uuid::new_v4(),
            name: new.name,
            link: new.link,
            owner: new.owner,
            likes: Vec::new(),
            created_at: Utc::now(),
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.cards.insert(card.id, (seq, card.clone()));
        Ok(card)
    }

    async fn find_card(&self, id: Uuid) -> StoreResult<Option<Card>> {
        Ok(self.cards.get(&id).map(|e| e.1.clone()))
    }

    async fn delete_card(&self, id: Uuid) -> StoreResult<Option<Card>> {
        Ok(self.cards.remove(&id).map(|(_, (_, card))| card))
    }

    async fn set_like(
        &self,
        card_id: Uuid,
        user_id: Uuid,
        liked: bool,
    ) -> StoreResult<Option<Card>> {
        Ok(self.cards.get_mut(&card_id).map(|mut entry| {
            let card = &mut entry.1;
            if liked {
                if !card.likes.contains(&user_id) {
                    card.likes.push(user_id);
                }
            } else {
                card.likes.retain(|id| *id != user_id);
            }
            card.clone()
        }))
    }
}
