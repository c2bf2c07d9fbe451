//! Identifier keys over a corpus of realistic and adversarial names

use std::collections::{BTreeSet, HashMap};

use factory_layout::ident::{normalize, ItemRegistry};

fn corpus() -> Vec<String> {
    let bases = [
        "Press", "Presse", "Préss", "Lathe", "Drill", "Mill", "Oven", "Four", "Öfen", "Ofen",
        "Mixer", "Mixeur", "Conveyor", "Convoyeur", "Robot", "Rôbot", "Pompe", "Pompé",
        "Straße", "Strasse", "Café", "Cafe", "東京", "京都", "Ελλάδα", "Москва",
    ];
    let decorations: [fn(&str) -> String; 5] = [
        |s| s.to_string(),
        |s| s.to_uppercase(),
        |s| format!("{} 2", s),
        |s| format!("{}-2", s),
        |s| format!("{}_2", s),
    ];

    let mut names = Vec::new();
    let mut seen = BTreeSet::new();
    for base in bases {
        for decorate in decorations {
            let name = decorate(base);
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    names.extend(["CNC #1", "CNC #2", "CNC #1 ", "cnc #1", "CNC№1", "CNC 1", "CNC1"].map(String::from));
    names
}

#[test]
fn test_corpus_keys_are_unique() {
    let names = corpus();
    assert!(names.len() >= 100, "corpus has only {} names", names.len());

    // "CNC #1 " trims to "CNC #1", so it must share that key
    let mut by_key: HashMap<String, Vec<&str>> = HashMap::new();
    for name in &names {
        by_key.entry(normalize(name)).or_default().push(name);
    }
    let shared: Vec<_> = by_key.values().filter(|v| v.len() > 1).collect();
    assert_eq!(shared, vec![&vec!["CNC #1", "CNC #1 "]]);
}

#[test]
fn test_keys_are_deterministic_and_ascii() {
    for name in corpus() {
        let key = normalize(&name);
        assert_eq!(key, normalize(&name));
        assert!(key.is_ascii(), "{:?} -> {:?}", name, key);
        assert!(
            key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
            "{:?} -> {:?}",
            name,
            key
        );
    }
}

#[test]
fn test_registry_accepts_whole_corpus() {
    let names: Vec<String> = corpus()
        .into_iter()
        .filter(|n| n != "CNC #1 ")
        .collect();
    let ids: Vec<String> = (0..names.len()).map(|i| format!("item-{}", i)).collect();
    let registry =
        ItemRegistry::new(ids.iter().map(String::as_str).zip(names.iter().map(String::as_str))).unwrap();

    assert_eq!(registry.len(), names.len());
    for (i, name) in names.iter().enumerate() {
        assert_eq!(registry.resolve(name), Some(i), "{:?}", name);
    }
}
