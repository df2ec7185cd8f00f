//! Byte-level cipher primitives.
//!
//! The alphabet is `a..=z`. Arithmetic wraps on `u8` so that bytes outside the
//! alphabet are transformed deterministically instead of panicking.

/// Letters whose glyph carries a dot, paired with their atbash partner.
const DOTTED_PAIRS: [(u8, u8); 6] = [
    (b'a', b'z'),
    (b'c', b'x'),
    (b'e', b'v'),
    (b'g', b't'),
    (b'i', b'r'),
    (b'k', b'p'),
];

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// True if both byte strings hold the same multiset of bytes.
pub fn check_anagram(s1: &[u8], s2: &[u8]) -> bool {
    if s1.len() != s2.len() {
        return false;
    }
    let mut counts1 = [0u32; 256];
    let mut counts2 = [0u32; 256];
    for &ch in s1 {
        counts1[usize::from(ch)] += 1;
    }
    for &ch in s2 {
        counts2[usize::from(ch)] += 1;
    }
    counts1 == counts2
}

pub fn inc_char(b: u8) -> u8 {
    let next = b.wrapping_add(1);
    if next > b'z' { b'a' } else { next }
}

pub fn dec_char(b: u8) -> u8 {
    let prev = b.wrapping_sub(1);
    if prev < b'a' { b'z' } else { prev }
}

pub fn inc_char_nowrap(b: u8) -> u8 {
    let next = b.wrapping_add(1);
    if next > b'z' { b'z' } else { next }
}

pub fn dec_char_nowrap(b: u8) -> u8 {
    let prev = b.wrapping_sub(1);
    if prev < b'a' { b'a' } else { prev }
}

pub fn rot13_char(b: u8) -> u8 {
    if b < b'n' {
        b'n'.wrapping_add(b.wrapping_sub(b'a'))
    } else {
        b'a'.wrapping_add(b.wrapping_sub(b'n'))
    }
}

pub fn atbash_char(b: u8) -> u8 {
    b'a'.wrapping_add(25u8.wrapping_sub(b.wrapping_sub(b'a')))
}

/// Atbash for the second half of the alphabet, identity for the first.
pub fn hardshift_left_char(b: u8) -> u8 {
    if b < b'n' { b } else { atbash_char(b) }
}

/// Atbash for the first half of the alphabet, identity for the second.
pub fn hardshift_right_char(b: u8) -> u8 {
    if b < b'n' { atbash_char(b) } else { b }
}

pub fn is_dotted(b: u8) -> bool {
    DOTTED_PAIRS
        .iter()
        .any(|&(left, right)| left == b || right == b)
}

/// The partner expected to follow `b` in a polygraphic pair, if `b` opens one.
pub fn dotted_partner(b: u8) -> Option<u8> {
    DOTTED_PAIRS
        .iter()
        .find(|&&(left, _)| left == b)
        .map(|&(_, right)| right)
}

pub fn inc_char_dotted(b: u8) -> u8 {
    if is_dotted(b) { inc_char(b) } else { b }
}

pub fn dec_char_undotted(b: u8) -> u8 {
    if is_dotted(b) { b } else { dec_char(b) }
}

pub fn map_chars(chars: &mut [u8], f: impl Fn(u8) -> u8) {
    for ch in chars.iter_mut() {
        *ch = f(*ch);
    }
}

pub fn map_chars_butfirst(chars: &mut [u8], f: impl Fn(u8) -> u8) {
    if chars.len() < 2 {
        return;
    }
    map_chars(&mut chars[1..], f);
}

pub fn map_chars_butlast(chars: &mut [u8], f: impl Fn(u8) -> u8) {
    if chars.len() < 2 {
        return;
    }
    let end = chars.len() - 1;
    map_chars(&mut chars[..end], f);
}

/// Map characters at odd 1-indexed positions (1st, 3rd, ...).
pub fn map_odd_chars(chars: &mut [u8], f: impl Fn(u8) -> u8) {
    for ch in chars.iter_mut().step_by(2) {
        *ch = f(*ch);
    }
}

/// Map characters at even 1-indexed positions (2nd, 4th, ...).
pub fn map_even_chars(chars: &mut [u8], f: impl Fn(u8) -> u8) {
    for ch in chars.iter_mut().skip(1).step_by(2) {
        *ch = f(*ch);
    }
}

pub fn rotate_chars_left(chars: &mut [u8]) {
    if !chars.is_empty() {
        chars.rotate_left(1);
    }
}

pub fn rotate_chars_right(chars: &mut [u8]) {
    if !chars.is_empty() {
        chars.rotate_right(1);
    }
}

pub fn reverse(chars: &mut [u8]) {
    chars.reverse();
}

/// Swap the first half with the second half.
///
/// For odd lengths the middle byte stays put and the second half starts one
/// past the midpoint.
pub fn swap_halves(chars: &mut [u8]) {
    if chars.len() < 2 {
        return;
    }
    let mid = chars.len() / 2;
    let offset = chars.len() % 2;
    for i in 0..mid {
        chars.swap(i, mid + offset + i);
    }
}

/// Swap each adjacent pair `(0,1)`, `(2,3)`, ...; a trailing odd byte stays.
pub fn zigzag(chars: &mut [u8]) {
    for pair in chars.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

/// Collapse every dotted pair by one step towards each other.
///
/// Scans left to right; when `chars[i]` opens a dotted pair and `chars[i + 1]` is
/// its partner, the first is incremented, the second decremented, and the scan
/// resumes after the pair.
pub fn polygraphic_atbash(chars: &mut [u8]) {
    let mut i = 0;
    while i + 1 < chars.len() {
        if dotted_partner(chars[i]) == Some(chars[i + 1]) {
            chars[i] = inc_char(chars[i]);
            chars[i + 1] = dec_char(chars[i + 1]);
            i += 1;
        }
        i += 1;
    }
}

/// Non-overlapping occurrence count of `needle` in `haystack`.
///
/// An empty needle matches between every byte, so it counts `len + 1`.
pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() {
        return haystack.len() + 1;
    }
    let mut count = 0;
    let mut rest = haystack;
    while let Some(at) = find_subslice(rest, needle) {
        count += 1;
        rest = &rest[at + needle.len()..];
    }
    count
}

pub fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || find_subslice(haystack, needle).is_some()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// 64-bit FNV-1a hash.
pub fn fnv1a64(data: &[u8]) -> u64 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}
