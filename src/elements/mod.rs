pub mod address_book;
pub mod call_script;
pub mod contracts;
pub mod vote;
