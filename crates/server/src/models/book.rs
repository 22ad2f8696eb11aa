//! Book catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bookmarket_core::BookId;

use super::validate::{ValidationErrors, require_price, require_trimmed};

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Normalized to lowercase on write.
    pub genre: String,
    pub description: String,
    /// Non-negative; decimal to avoid float drift in cart totals.
    pub price: Decimal,
    /// Reference to a cover image (URL or asset path).
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Incoming book payload for create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct BookDraft {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

/// A fully validated draft, text trimmed and genre lowercased.
#[derive(Debug, Clone)]
pub struct ValidBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
}

impl BookDraft {
    /// Validate every field, accumulating all failures.
    ///
    /// # Errors
    ///
    /// Returns the full list of field failures when any check fails.
    pub fn validate(self) -> Result<ValidBook, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = require_trimmed(&mut errors, "title", self.title.as_deref().unwrap_or(""));
        let author = require_trimmed(&mut errors, "author", self.author.as_deref().unwrap_or(""));
        let genre = require_trimmed(&mut errors, "genre", self.genre.as_deref().unwrap_or(""))
            .map(|g| g.to_lowercase());
        let description = require_trimmed(
            &mut errors,
            "description",
            self.description.as_deref().unwrap_or(""),
        );
        let image = require_trimmed(&mut errors, "image", self.image.as_deref().unwrap_or(""));

        let price = require_price(&mut errors, "price", self.price);

        match (title, author, genre, description, price, image) {
            (Some(title), Some(author), Some(genre), Some(description), Some(price), Some(image)) => {
                Ok(ValidBook {
                    title,
                    author,
                    genre,
                    description,
                    price,
                    image,
                })
            }
            _ => Err(errors),
        }
    }
}

impl ValidBook {
    /// Materialize a new catalog entry with a fresh id.
    #[must_use]
    pub fn into_book(self, now: DateTime<Utc>) -> Book {
        Book {
            id: BookId::generate(),
            title: self.title,
            author: self.author,
            genre: self.genre,
            description: self.description,
            price: self.price,
            image: self.image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply this draft onto an existing entry, bumping `updated_at`.
    #[must_use]
    pub fn apply_to(self, mut book: Book, now: DateTime<Utc>) -> Book {
        book.title = self.title;
        book.author = self.author;
        book.genre = self.genre;
        book.description = self.description;
        book.price = self.price;
        book.image = self.image;
        book.updated_at = now;
        book
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> BookDraft {
        BookDraft {
            title: Some("Dune".to_string()),
            author: Some("Frank Herbert".to_string()),
            genre: Some("Science Fiction".to_string()),
            description: Some("Spice and sandworms.".to_string()),
            price: Some("12.99".parse().unwrap()),
            image: Some("/covers/dune.jpg".to_string()),
        }
    }

    #[test]
    fn genre_is_lowercased() {
        let valid = draft().validate().unwrap();
        assert_eq!(valid.genre, "science fiction");
    }

    #[test]
    fn negative_price_rejected() {
        let mut d = draft();
        d.price = Some("-1".parse().unwrap());
        let err = d.validate().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field, "price");
    }

    #[test]
    fn zero_price_allowed() {
        let mut d = draft();
        d.price = Some(Decimal::ZERO);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn price_beyond_storage_range_rejected() {
        let mut d = draft();
        d.price = Some(Decimal::MAX);
        let err = d.validate().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field, "price");
    }

    #[test]
    fn missing_fields_all_reported() {
        let err = BookDraft {
            title: None,
            author: Some("   ".to_string()),
            genre: None,
            description: None,
            price: None,
            image: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.errors().len(), 6);
    }

    #[test]
    fn apply_to_keeps_id_and_created_at() {
        let created = Utc::now();
        let book = draft().validate().unwrap().into_book(created);
        let id = book.id;

        let mut updated_draft = draft();
        updated_draft.title = Some("Dune Messiah".to_string());
        let later = Utc::now();
        let updated = updated_draft.validate().unwrap().apply_to(book, later);

        assert_eq!(updated.id, id);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.updated_at, later);
    }
}
