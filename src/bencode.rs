//! Canonical bencode encoding ([BEP-3]).
//!
//! Only the encoding direction is needed to produce `.torrent` files and info
//! hashes. The encoder always emits the canonical form: dictionaries are
//! backed by a [`BTreeMap`](std::collections::BTreeMap) keyed by raw bytes, so
//! keys come out in sorted lexicographic order no matter how they were
//! inserted. Two encoders fed equal [`Value`] trees therefore produce
//! byte-identical output, which is what keeps info hashes stable.
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` |
//! | Byte String | `<length>:<data>` | `4:spam` |
//! | List | `l<items>e` | `l4:spami42ee` |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` |
//!
//! # Examples
//!
//! ```
//! use torrent_forge::bencode::{encode, DictBuilder, Value};
//!
//! let info = DictBuilder::new()
//!     .with("piece length", 16384i64)
//!     .with("name", "example")
//!     .build();
//!
//! assert_eq!(&encode(&info)[..], b"d4:name7:example12:piece lengthi16384ee");
//! assert_eq!(&encode(&Value::List(vec![1i64.into()]))[..], b"li1ee");
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod encode;
mod value;

pub use encode::{encode, encode_into};
pub use value::{DictBuilder, Value};
