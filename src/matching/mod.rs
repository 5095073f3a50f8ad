pub mod fuzzy;
pub mod synonyms;

pub use fuzzy::{
    ChoiceText, MatchRung, MatchVerdict, Rejection, boolean_class, find_option, fuzzy_match,
    match_option, normalize,
};
