//! 类型模块：卡组请求、闪卡记录与语音片段的数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of everything that crosses the cache or the
//! HTTP boundary.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DeckRequest`] | Validated (source, target, difficulty) triple |
//! | [`Difficulty`] | Beginner / Intermediate / Expert |
//! | [`CardText`] | Card text returned by the provider |
//! | [`FlashcardRecord`] | Complete card with normalized type and image |
//! | [`GrammaticalType`] | Closed set: noun, verb, adjective, other |
//! | [`DeckPayload`] | Cached deck document body |
//! | [`AudioPayload`] | Cached speech clip body |

pub mod audio;
pub mod deck;

pub use audio::AudioPayload;
pub use deck::{
    CardText, DeckPayload, DeckRequest, Difficulty, FlashcardRecord, GrammaticalType, NO_IMAGE,
};
