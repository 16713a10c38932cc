use std::{collections::BTreeSet, env, fmt, io::Write, ops, process::Command, sync::OnceLock};

use allsorts::{binary::read::ReadScope, font::MatchingPresentation, font_data::FontData};
use test_casing::{test_casing, Product};

use crate::{font::Glyph, testing::FontBuilder, Font, FontSubset, NameTable, UnicodeRanges};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum TestFont {
    /// Latin and Cyrillic letters with composite glyphs for accented letters.
    Sans,
    /// Font with chars outside the Basic Multilingual Plane.
    Emoji,
}

impl fmt::Debug for TestFont {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Sans => "Example Sans",
            Self::Emoji => "Example Emoji",
        })
    }
}

impl TestFont {
    pub(crate) fn build(self) -> Vec<u8> {
        static SANS: OnceLock<Vec<u8>> = OnceLock::new();
        static EMOJI: OnceLock<Vec<u8>> = OnceLock::new();

        match self {
            Self::Sans => SANS.get_or_init(|| {
                FontBuilder::new("Example Sans", "Regular")
                    .with_chars(' '..='~')
                    .with_chars('\u{410}'..='\u{44f}')
                    .with_composite('à', &['a', '\u{300}'])
                    .with_composite('é', &['e', '\u{301}'])
                    .with_composite('ǻ', &['å', '\u{301}'])
                    .with_hinting()
                    .build()
            }),
            Self::Emoji => EMOJI.get_or_init(|| {
                FontBuilder::new("Example Emoji", "Regular")
                    .with_chars('0'..='9')
                    .with_chars('\u{1f600}'..='\u{1f64f}')
                    .build()
            }),
        }
        .clone()
    }
}

pub(crate) const FONTS: [TestFont; 2] = [TestFont::Sans, TestFont::Emoji];

#[derive(Debug, Clone)]
pub(crate) enum TestCharSubset {
    Range(ops::RangeInclusive<char>),
    Str(&'static str),
}

impl TestCharSubset {
    pub(crate) fn into_set(self) -> BTreeSet<char> {
        match self {
            Self::Range(range) => range.collect(),
            Self::Str(s) => s.chars().collect(),
        }
    }
}

pub(crate) const SUBSET_CHARS: [TestCharSubset; 5] = [
    TestCharSubset::Range(' '..='~'),
    TestCharSubset::Range('0'..='9'),
    TestCharSubset::Str("Hello, wörld! 😀"),
    TestCharSubset::Str("Приветà"),
    TestCharSubset::Str("A"),
];

#[derive(Debug)]
struct OpenTypeSanitizer {
    path: Option<String>,
}

impl Default for OpenTypeSanitizer {
    fn default() -> Self {
        let Ok(path) = env::var("OTS_SANITIZER") else {
            return Self { path: None };
        };
        let output = Command::new(&path)
            .arg("--version")
            .output()
            .unwrap_or_else(|err| {
                panic!("failed getting version for ots-sanitize at {path}: {err}");
            });
        assert!(
            output.status.success(),
            "failed getting version for ots-sanitize at {path}: non-zero exit code"
        );
        let version = String::from_utf8(output.stdout).unwrap_or_else(|err| {
            panic!("failed getting version for ots-sanitize at {path}: {err}");
        });
        println!("ots-sanitize version: {version}");
        Self { path: Some(path) }
    }
}

impl OpenTypeSanitizer {
    fn get() -> &'static Self {
        static SANITIZER: OnceLock<OpenTypeSanitizer> = OnceLock::new();
        SANITIZER.get_or_init(Self::default)
    }

    fn validate(&self, content: &[u8]) {
        let Some(path) = &self.path else {
            println!("OTS_SANITIZER env var is missing; skipping checks");
            return;
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.as_file_mut().write_all(content).unwrap();
        file.as_file_mut().flush().unwrap();
        let file_path = file.into_temp_path();

        let output = Command::new(path)
            .arg(&file_path)
            .output()
            .expect("failed running ots-sanitize");
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("ots-sanitize failed:\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}");
        }
    }
}

#[test]
fn mapping_chars_matches_reference_implementation() {
    let font_bytes = TestFont::Sans.build();
    let font = Font::new(&font_bytes).unwrap();

    let font_file = ReadScope::new(&font_bytes).read::<FontData>().unwrap();
    let font_provider = font_file.table_provider(0).unwrap();
    let mut reference_font = allsorts::Font::new(font_provider).unwrap();

    for ch in "Hello, world! Привет àéǻ ├└█▒".chars() {
        let id = font.map_char(ch).unwrap();
        let (expected_idx, _) =
            reference_font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        assert_eq!(id, expected_idx, "{ch:?}");
    }
}

#[test_casing(10, Product((FONTS, SUBSET_CHARS)))]
fn subsetting_font(font: TestFont, chars: TestCharSubset) {
    let font_bytes = font.build();
    let font = Font::new(&font_bytes).unwrap();
    let chars = chars.into_set();
    let covered_chars: Vec<_> = chars
        .iter()
        .copied()
        .filter(|&ch| font.map_char(ch).unwrap() != 0)
        .collect();

    let subset = FontSubset::new(font, &chars).unwrap();
    assert_eq!(subset.chars().collect::<Vec<_>>(), covered_chars);
    assert_eq!(subset.is_empty(), covered_chars.is_empty());
    if subset.is_empty() {
        return;
    }

    let ttf = subset.to_truetype();
    assert_valid_font(&ttf, true, covered_chars.iter().copied());
    let woff2 = subset.to_woff2();
    assert_valid_font(&woff2, false, covered_chars.iter().copied());
}

#[test]
fn subset_includes_composite_components() {
    let font_bytes = TestFont::Sans.build();
    let font = Font::new(&font_bytes).unwrap();
    let chars = BTreeSet::from(['ǻ']);
    let subset = font.subset(&chars).unwrap();

    // 'ǻ' references 'å' and U+0301; the latter are mapped in the source font, but not in the subset
    assert_eq!(subset.chars().collect::<Vec<_>>(), ['ǻ']);
    assert_eq!(subset.glyph_count(), 3);
    let ttf = subset.to_truetype();
    let subset_font = Font::new(&ttf).unwrap();
    assert_eq!(subset_font.glyph_count(), 4);
    assert_eq!(subset_font.map_char('ǻ').unwrap(), 3);
    assert_eq!(subset_font.map_char('å').unwrap(), 0);
}

#[test]
fn composite_missing_glyph_is_remapped() {
    let font_bytes = FontBuilder::new("Example Sans", "Regular")
        .with_chars('A'..='Z')
        .with_composite_notdef(&['?'])
        .build();
    let font = Font::new(&font_bytes).unwrap();
    assert_eq!(font.map_char('?').unwrap(), 27);
    let subset = font.subset(&BTreeSet::from(['A'])).unwrap();
    assert_eq!(subset.glyph_count(), 2);

    let ttf = subset.to_truetype();
    let subset_font = Font::new(&ttf).unwrap();
    assert_eq!(subset_font.glyph_count(), 3);
    assert_eq!(subset_font.map_char('A').unwrap(), 2);
    assert_eq!(subset_font.map_char('?').unwrap(), 0);
    let Glyph::Composite { components, .. } = subset_font.glyph(0).unwrap().inner else {
        panic!("expected a composite glyph");
    };
    let indices: Vec<_> = components.iter().map(|c| c.glyph_idx).collect();
    assert_eq!(indices, [1]);
    assert!(matches!(subset_font.glyph(1).unwrap().inner, Glyph::Simple(_)));
}

#[test]
fn subset_without_covered_chars_is_empty() {
    let font_bytes = TestFont::Emoji.build();
    let font = Font::new(&font_bytes).unwrap();
    let chars = UnicodeRanges::parse("U+0000-002F,U+0400-04FF")
        .unwrap()
        .to_char_set();
    let subset = FontSubset::new(font, &chars).unwrap();

    assert!(subset.is_empty());
    assert_eq!(subset.chars().len(), 0);
    assert_eq!(subset.glyph_count(), 0);
}

#[test]
fn subset_retains_names() {
    let font_bytes = TestFont::Sans.build();
    let font = Font::new(&font_bytes).unwrap();
    let subset = font.subset(&BTreeSet::from(['A'])).unwrap();
    let ttf = subset.to_truetype();

    let names = NameTable::from_font_data(&ttf).unwrap();
    assert_eq!(names.family().unwrap(), "Example Sans");
    assert_eq!(names.subfamily().unwrap(), "Regular");
}

#[test]
fn subsetting_is_deterministic() {
    let font_bytes = TestFont::Sans.build();
    let chars = UnicodeRanges::parse("U+0000-00FF").unwrap().to_char_set();
    let first = Font::new(&font_bytes).unwrap().subset(&chars).unwrap().to_woff2();
    let second = Font::new(&font_bytes).unwrap().subset(&chars).unwrap().to_woff2();
    assert_eq!(first, second);
}

fn assert_valid_font(raw: &[u8], is_ttf: bool, expected_chars: impl Iterator<Item = char>) {
    if is_ttf {
        Font::new(raw).unwrap();
    }

    let font_file = ReadScope::new(raw).read::<FontData>().unwrap();
    let font_provider = font_file.table_provider(0).unwrap();
    let mut font = allsorts::Font::new(font_provider).unwrap();
    for ch in expected_chars {
        let (glyph_id, _) = font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        assert_ne!(glyph_id, 0, "{ch:?}");
    }

    OpenTypeSanitizer::get().validate(raw);
}
