use super::{DisplayChunk, FALLBACK_NOTICE, extract, prepare, unprocessed};

const SWAP_ANSWER: &str = "Sure! Here is a simple algorithm in C to swap two numbers using a temporary variable:

```c
#include <stdio.h>

int main() {
    int a = 5, b = 10, temp;

    printf(\"Before swapping: a = %d, b = %d\\n\", a, b);

    temp = a;
    a = b;
    b = temp;

    printf(\"After swapping: a = %d, b = %d\\n\", a, b);

    return 0;
}
```

This algorithm uses a temporary variable to store one value while swapping occurs.";

fn texts(chunks: &[DisplayChunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn prepare_short_answer() {
    let chunks = prepare("Hello world.", 150).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Hello world.");
    assert!(!chunks[0].contains_code);
    assert_eq!(chunks[0].total_count, 1);
}

#[test]
fn prepare_empty_answer_uses_fallback() {
    for raw in ["", "   ", "\n\t\n"] {
        let chunks = prepare(raw, 150).unwrap();
        assert_eq!(texts(&chunks), [FALLBACK_NOTICE]);
    }
}

#[test]
fn prepare_code_answer_splits_prose_code_prose() {
    let chunks = prepare(SWAP_ANSWER, 150).unwrap();
    assert_eq!(chunks.len(), 3);
    assert!(!chunks[0].contains_code);
    assert!(chunks[0].text.starts_with("Sure!"));
    assert!(chunks[1].contains_code);
    assert!(chunks[1].text.starts_with("C Code:\n#include <stdio.h>"));
    assert!(chunks[1].text.ends_with("return 0;\n}"));
    assert!(chunks[1].text.chars().count() > 150);
    assert!(chunks[2].text.starts_with("This algorithm"));
}

#[test]
fn prepare_unterminated_fence_is_prose() {
    let chunks = prepare("Try this: ```python\nprint('hi')", 150).unwrap();
    assert!(chunks.iter().all(|c| !c.contains_code));
    let joined = texts(&chunks).join(" ");
    assert!(joined.contains("```python"));
    assert!(joined.contains("print('hi')"));
}

#[test]
fn code_bodies_round_trip() {
    let raw = "Intro.\n```rust\nfn a() {}\n```\nMiddle text.\n```\n  let x = 1;\n\n  let y = 2;\n```\nEnd.";
    let listings = extract(raw).listings;
    let chunks = prepare(raw, 20).unwrap();
    let bodies: Vec<String> = chunks
        .iter()
        .filter(|c| c.contains_code)
        .map(|c| c.text.split_once('\n').map(|(_, b)| b.to_string()).unwrap())
        .collect();
    let expected: Vec<String> = listings.into_iter().map(|l| l.body).collect();
    assert_eq!(bodies, expected);
}

#[test]
fn prose_content_is_not_lost() {
    let raw = "Bubble sort compares adjacent elements.  It swaps them if needed!\n\n\nIs it fast? Not really: O(n^2) in the worst case. Use quicksort (or mergesort) for big inputs.";
    let chunks = prepare(raw, 40).unwrap();
    assert!(chunks.len() > 1);
    assert_eq!(squash(&texts(&chunks).join(" ")), squash(raw));
}

#[test]
fn chunks_respect_the_cap_and_order() {
    let raw = [SWAP_ANSWER; 3].join("\n\n");
    let chunks = prepare(&raw, 100).unwrap();
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
        assert_eq!(chunk.total_count, chunks.len());
        if !chunk.contains_code {
            assert!(chunk.text.chars().count() <= 100, "{:?}", chunk.text);
        }
    }
    assert_eq!(chunks.iter().filter(|c| c.contains_code).count(), 3);
}

#[test]
fn no_sentence_is_split() {
    let sentences = [
        "The pass through the list is repeated.",
        "Smaller elements bubble to the top!",
        "Is it efficient?",
        "Not for large datasets.",
    ];
    let raw = sentences.join(" ");
    let chunks = prepare(&raw, 45).unwrap();
    for chunk in &chunks {
        for sentence in &sentences {
            let head = &sentence[..10];
            if chunk.text.contains(head) {
                assert!(chunk.text.contains(sentence));
            }
        }
    }
}

#[test]
fn hard_wrapped_sentence_stays_in_one_chunk() {
    let chunks = prepare("First sentence is here. Second\nsentence ends.", 40).unwrap();
    assert_eq!(
        texts(&chunks),
        ["First sentence is here.", "Second sentence ends."]
    );
}

#[test]
fn unprocessed_keeps_raw_text() {
    assert_eq!(texts(&unprocessed("  raw  answer ")), ["raw  answer"]);
    assert_eq!(texts(&unprocessed("")), [FALLBACK_NOTICE]);
}
