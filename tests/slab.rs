extern crate nexio;

use nexio::nio::Token;
use nexio::slab::Slab;

struct Conn {
    name: &'static str,
    bytes: usize,
}

impl Conn {
    fn new(name: &'static str) -> Self {
        Conn { name, bytes: 0 }
    }
}

#[test]
fn slab_insert_reuses_vacant_slots() {
    let mut slab: Slab<Conn, Token> = Slab::new();
    let a = slab.insert(Conn::new("a"));
    let b = slab.insert(Conn::new("b"));
    assert_eq!(usize::from(a), 0);
    assert_eq!(usize::from(b), 1);
    assert_eq!(slab.len(), 2);

    assert_eq!(slab.remove(a).map(|c| c.name), Some("a"));
    assert!(!slab.contains(a));
    let c = slab.insert(Conn::new("c"));
    assert_eq!(c, a);
    assert_eq!(slab[c].name, "c");
    assert_eq!(slab.len(), 2);
}

#[test]
fn slab_reuses_most_recently_freed() {
    let mut slab: Slab<Conn, Token> = Slab::new();
    let ids: Vec<Token> = ["a", "b", "c"]
        .iter()
        .map(|&name| slab.insert(Conn::new(name)))
        .collect();
    slab.remove(ids[0]);
    slab.remove(ids[2]);
    assert_eq!(slab.insert(Conn::new("d")), ids[2]);
    assert_eq!(slab.insert(Conn::new("e")), ids[0]);
    assert_eq!(usize::from(slab.insert(Conn::new("f"))), 3);
    assert_eq!(slab.len(), 4);
}

#[test]
fn slab_remove_twice() {
    let mut slab: Slab<Conn, Token> = Slab::new();
    let a = slab.insert(Conn::new("a"));
    assert!(slab.remove(a).is_some());
    assert!(slab.remove(a).is_none());
    assert!(slab.is_empty());
}

#[test]
fn slab_get_mut() {
    let mut slab: Slab<Conn, Token> = Slab::default();
    let a = slab.insert(Conn::new("a"));
    slab.get_mut(a).unwrap().bytes += 10;
    assert_eq!(slab.get(a).map(|c| c.bytes), Some(10));
    assert_eq!(slab[a].bytes, 10);
}

#[test]
fn slab_iter_skips_vacant() {
    let mut slab: Slab<Conn, Token> = Slab::new();
    let a = slab.insert(Conn::new("a"));
    let b = slab.insert(Conn::new("b"));
    let c = slab.insert(Conn::new("c"));
    slab.remove(b);

    let names: Vec<_> = slab.iter().map(|(id, conn)| (id, conn.name)).collect();
    assert_eq!(names, vec![(a, "a"), (c, "c")]);
}

#[test]
fn slab_unknown_idx() {
    let mut slab: Slab<Conn, Token> = Slab::new();
    slab.insert(Conn::new("a"));
    let unknown = Token::from(42);

    assert!(slab.get(unknown).is_none());
    assert!(slab.get_mut(unknown).is_none());
    assert!(slab.remove(unknown).is_none());
    assert_eq!(slab.len(), 1);
}

#[test]
#[should_panic]
fn slab_index_vacant_panics() {
    let mut slab: Slab<Conn, Token> = Slab::new();
    let a = slab.insert(Conn::new("a"));
    slab.remove(a);
    let _ = slab[a].bytes;
}
