mod common;

use common::*;
use tiny_rope::{Rope, MIN_NODE_SIZE};

#[test]
fn test_build_thousand_elements() {
    init_tracing();
    let rope: Rope<Int> = (1..=1000).map(Int).collect();

    assert_eq!(rope.count(&Count), 1000);
    assert_eq!(rope.summary().sum, 500_500);
    assert_eq!(values(&rope), (1..=1000).collect::<Vec<_>>());
    assert!(rope.height() >= 2);
    rope.check_invariants().unwrap();
}

#[test]
fn test_empty_rope() {
    let rope: Rope<Int> = Rope::new();

    assert!(rope.is_empty());
    assert_eq!(rope.count(&Count), 0);
    assert_eq!(rope.first(), None);
    assert_eq!(rope.last(), None);
    assert_eq!(rope.start_index(), rope.end_index());
    assert!(rope.is_end(&rope.start_index()));
    assert_eq!(rope.get(&rope.start_index()), None);
    assert_eq!(rope.iter().next(), None);
    assert_eq!(rope.dump(), "(empty)\n");
    rope.check_invariants().unwrap();
}

#[test]
fn test_single_element() {
    let rope = Rope::from_element(Int(42));

    assert!(!rope.is_empty());
    assert_eq!(rope.height(), 0);
    assert_eq!(values(&rope), vec![42]);
    assert_eq!(rope.first(), Some(&Int(42)));
    assert_eq!(rope.last(), Some(&Int(42)));

    let start = rope.start_index();
    assert_ne!(start, rope.end_index());
    assert_eq!(rope[&start], Int(42));
    assert_eq!(rope.index_after(&start), rope.end_index());
    assert_eq!(rope.index_before(&rope.end_index()), start);
    rope.check_invariants().unwrap();
}

#[test]
fn test_small_root_leaf_is_allowed() {
    for len in 0..MIN_NODE_SIZE as u64 {
        let rope = ints(0..len);
        assert_eq!(rope.height(), 0);
        assert_eq!(rope.count(&Count), len as usize);
        rope.check_invariants().unwrap();
    }
}

#[test]
fn test_push_and_push_front() {
    let mut rope = Rope::new();
    for i in 100..400 {
        rope.push(Int(i));
    }
    for i in (0..100).rev() {
        rope.push_front(Int(i));
    }

    assert_eq!(values(&rope), (0..400).collect::<Vec<_>>());
    rope.check_invariants().unwrap();
}

#[test]
fn test_insert_by_offset() {
    let mut rope = ints(0..200);
    let (index, remaining) = rope.find(50, &Count, false);
    assert_eq!(remaining, 0);
    assert_eq!(rope[&index], Int(50));

    rope.insert(Int(1000), &index);

    let mut expected: Vec<u64> = (0..200).collect();
    expected.insert(50, 1000);
    assert_eq!(values(&rope), expected);
    rope.check_invariants().unwrap();

    rope.insert_at(Int(2000), 0, &Count);
    rope.insert_at(Int(3000), rope.count(&Count), &Count);
    expected.insert(0, 2000);
    expected.push(3000);
    assert_eq!(values(&rope), expected);
    rope.check_invariants().unwrap();
}

#[test]
fn test_insert_splits_nodes_everywhere() {
    let mut rope = Rope::new();
    let mut expected = Vec::new();
    for i in 0..600u64 {
        let position = (i as usize * 7) % (expected.len() + 1);
        let (index, _) = rope.find(position, &Count, false);
        rope.insert(Int(i), &index);
        expected.insert(position, i);
    }

    assert_eq!(values(&rope), expected);
    rope.check_invariants().unwrap();
}

#[test]
fn test_remove_until_empty() {
    let mut rope = ints(0..300);
    let mut expected: Vec<u64> = (0..300).collect();

    while !expected.is_empty() {
        let position = (expected.len() * 3) / 5;
        let (index, _) = rope.find(position, &Count, false);
        let removed = rope.remove(&index);
        assert_eq!(removed.0, expected.remove(position));
        rope.check_invariants().unwrap();
    }

    assert!(rope.is_empty());
    assert_eq!(values(&rope), Vec::<u64>::new());
}

#[test]
fn test_remove_from_last_leaf_merges_with_previous() {
    let mut rope = ints(0..17);
    assert_eq!(rope.height(), 1);

    for expected_last in [16, 15] {
        let (index, _) = rope.find(rope.count(&Count) - 1, &Count, false);
        assert_eq!(rope.remove(&index).0, expected_last);
        rope.check_invariants().unwrap();
    }

    assert_eq!(rope.height(), 0);
    let mut index = rope.start_index();
    let mut seen = Vec::new();
    while !rope.is_end(&index) {
        seen.push(rope[&index].0);
        rope.form_index_after(&mut index);
    }
    assert_eq!(seen, (0..15).collect::<Vec<_>>());
}

#[test]
fn test_join_small_before_large() {
    let joined = Rope::join(ints(0..3), ints(3..20));
    assert_eq!(values(&joined), (0..20).collect::<Vec<_>>());
    joined.check_invariants().unwrap();

    let mut index = joined.end_index();
    for expected in (0..20).rev() {
        joined.form_index_before(&mut index);
        assert_eq!(joined[&index].0, expected);
    }
}

#[test]
fn test_remove_range() {
    let mut rope = ints(0..500);
    let (start, _) = rope.find(120, &Count, false);
    let (end, _) = rope.find(380, &Count, false);

    rope.remove_range(start..end);

    let expected: Vec<u64> = (0..120).chain(380..500).collect();
    assert_eq!(values(&rope), expected);
    rope.check_invariants().unwrap();

    let everything = rope.start_index()..rope.end_index();
    rope.remove_range(everything);
    assert!(rope.is_empty());
}

#[test]
fn test_update_keeps_summaries() {
    let mut rope = ints(0..100);
    let version = rope.version();
    let (mut index, _) = rope.find(10, &Count, false);

    let old = rope.update(&mut index, |int| {
        let old = int.0;
        int.0 = 1_000;
        old
    });

    assert_eq!(old, 10);
    assert_eq!(rope.version(), version);
    assert_eq!(rope[&index], Int(1_000));
    assert_eq!(rope.summary().sum, (0..100).sum::<u64>() - 10 + 1_000);
    rope.check_invariants().unwrap();
}

#[test]
fn test_update_to_empty_removes() {
    let mut rope = text_rope("hello world, this is a longer piece of text");
    let version = rope.version();
    let mut index = rope.start_index();

    let removed_text = rope.update(&mut index, |chunk| std::mem::take(&mut chunk.0));

    assert_ne!(rope.version(), version);
    assert_eq!(
        format!("{}{}", removed_text, text(&rope)),
        "hello world, this is a longer piece of text"
    );
    rope.check_invariants().unwrap();
}

#[test]
fn test_copy_on_write_isolation() {
    let original = ints(0..400);
    let mut copy = original.clone();
    assert_eq!(copy.version(), original.version());

    copy.push(Int(999));
    let (index, _) = copy.find(17, &Count, false);
    copy.remove(&index);
    let (mut index, _) = copy.find(200, &Count, false);
    copy.update(&mut index, |int| int.0 = 0);

    assert_eq!(values(&original), (0..400).collect::<Vec<_>>());
    assert_eq!(original.summary().sum, (0..400).sum::<u64>());
    assert_ne!(values(&copy), values(&original));
    original.check_invariants().unwrap();
    copy.check_invariants().unwrap();
}

#[test]
fn test_append_and_join() {
    for (left, right) in [(0, 5), (5, 0), (3, 700), (700, 3), (256, 257), (1, 1), (40, 4000)] {
        let joined = Rope::join(ints(0..left), ints(left..left + right));
        assert_eq!(values(&joined), (0..left + right).collect::<Vec<_>>());
        joined.check_invariants().unwrap();

        let mut prepended = ints(left..left + right);
        prepended.prepend(ints(0..left));
        assert_eq!(prepended, joined);
    }
}

#[test]
fn test_split_off_and_rejoin() {
    let original = ints(0..1000);
    for offset in [0, 1, 15, 16, 17, 255, 256, 500, 999, 1000] {
        let mut left = original.clone();
        let (index, _) = left.find(offset, &Count, false);
        let right = left.split_off(&index);

        assert_eq!(values(&left), (0..offset as u64).collect::<Vec<_>>());
        assert_eq!(values(&right), (offset as u64..1000).collect::<Vec<_>>());
        left.check_invariants().unwrap();
        right.check_invariants().unwrap();

        left.append(right);
        assert_eq!(left, original);
    }
}

#[test]
fn test_extend() {
    let mut rope = ints(0..10);
    rope.extend((10..300).map(Int));
    assert_eq!(values(&rope), (0..300).collect::<Vec<_>>());
    rope.check_invariants().unwrap();
}

#[test]
fn test_version_bumps_on_mutation() {
    let mut rope = ints(0..50);
    let before = rope.version();
    rope.push(Int(50));
    assert_eq!(rope.version(), before.wrapping_add(1));

    let before = rope.version();
    rope.append(ints(0..5));
    assert_ne!(rope.version(), before);
}

#[test]
#[should_panic(expected = "stale")]
fn test_stale_index_panics() {
    let mut rope = ints(0..50);
    let index = rope.start_index();
    rope.push(Int(50));
    let _ = rope.get(&index);
}

// === Text ===

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    (0..=offset)
        .rev()
        .find(|&at| text.is_char_boundary(at))
        .unwrap_or(0)
}

#[test]
fn test_text_counts() {
    let sample = sample_text(40);
    let rope = text_rope(&sample);

    assert_eq!(rope.count(&Bytes), sample.len());
    assert_eq!(rope.count(&Chars), sample.chars().count());
    assert_eq!(rope.count(&Lines), 40);
    assert_eq!(text(&rope), sample);
    assert!(rope.summary().chunks < sample.chars().count());
    rope.check_invariants().unwrap();
}

#[test]
fn test_text_insert_inside_chunk() {
    let sample = sample_text(20);
    let mut rope = text_rope(&sample);

    for offset in [0, 3, 100, 257, sample.len()] {
        let mut expected = text(&rope);
        let offset = floor_char_boundary(&expected, offset);
        rope.insert_at(Chunk::new("<>"), offset, &Bytes);
        expected.insert_str(offset, "<>");
        assert_eq!(text(&rope), expected);
        rope.check_invariants().unwrap();
    }
}

#[test]
fn test_text_insert_by_char_offset() {
    let mut rope = text_rope("ünïcödé and more text after it");
    rope.insert_at(Chunk::new("X"), 3, &Chars);
    assert_eq!(text(&rope), "ünïXcödé and more text after it");
    rope.check_invariants().unwrap();
}

#[test]
fn test_text_split_off_at() {
    let sample = sample_text(30);
    for offset in [0, 1, 9, 10, 333, 500, sample.len() - 1, sample.len()] {
        let offset = floor_char_boundary(&sample, offset);
        let mut left = text_rope(&sample);
        let right = left.split_off_at(offset, &Bytes);

        assert_eq!(text(&left), &sample[..offset]);
        assert_eq!(text(&right), &sample[offset..]);
        left.check_invariants().unwrap();
        right.check_invariants().unwrap();
    }
}

#[test]
fn test_text_locate_and_offset_of() {
    let sample = sample_text(10);
    let rope = text_rope(&sample);

    for offset in 0..=sample.len() {
        let (index, position) = rope.locate(offset, &Bytes).unwrap();
        let start = rope.offset_of(&index, &Bytes);
        assert_eq!(start + position, offset);
        assert!(position <= rope[&index].0.len());
    }

    // The chunk holding the fourth newline
    let (line, _) = rope.find(3, &Lines, false);
    let chunk_start = rope.offset_of(&line, &Bytes);
    let newline = sample.match_indices('\n').nth(3).unwrap().0;
    assert!(chunk_start <= newline);
    assert!(newline < chunk_start + rope[&line].0.len());

    assert!(Rope::<Chunk>::new().locate(0, &Bytes).is_none());
}

#[test]
fn test_text_undersized_pushes_merge() {
    let mut rope = Rope::new();
    for ch in "abcdefghijklmnopqrstuvwxyz".chars() {
        rope.push(Chunk::new(&ch.to_string()));
    }

    assert_eq!(text(&rope), "abcdefghijklmnopqrstuvwxyz");
    assert!(rope.summary().chunks <= 4);
    rope.check_invariants().unwrap();
}

#[test]
fn test_text_insert_absorbed_by_neighbors() {
    let mut rope: Rope<Chunk> = ["abcdefgh", "ijklmnop"].into_iter().map(Chunk::new).collect();
    assert_eq!(rope.summary().chunks, 2);
    let version = rope.version();

    let start = rope.start_index();
    rope.insert(Chunk::new("x"), &start);
    assert_eq!(text(&rope), "xabcdefghijklmnop");
    assert_eq!(rope.summary().chunks, 2);
    assert_ne!(rope.version(), version);
    rope.check_invariants().unwrap();

    let end = rope.end_index();
    rope.insert(Chunk::new("!"), &end);
    assert_eq!(text(&rope), "xabcdefghijklmnop!");
    assert_eq!(rope.summary().chunks, 2);
    rope.check_invariants().unwrap();
}
