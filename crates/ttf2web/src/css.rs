//! CSS stylesheet generation.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Component, Path},
};

use crate::{Error, FontMetadata, SubsetResult};

/// Converts a file path to a URL path, joining components with `/` regardless of the platform.
fn css_url(path: &Path) -> String {
    let mut url = String::new();
    for component in path.components() {
        let segment = match component {
            Component::RootDir => {
                url.push('/');
                continue;
            }
            Component::Prefix(prefix) => prefix.as_os_str().to_string_lossy(),
            Component::CurDir => ".".into(),
            Component::ParentDir => "..".into(),
            Component::Normal(segment) => segment.to_string_lossy(),
        };
        if !url.is_empty() && !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&segment);
    }
    url
}

/// Renders a single `@font-face` rule for the generated subset file.
pub fn render_font_face(metadata: &FontMetadata, result: &SubsetResult) -> String {
    let FontMetadata {
        family,
        style,
        weight,
    } = metadata;
    let url = css_url(&result.output_path);

    format!(
        "@font-face {{\n\
         \tfont-family: \"{family}\";\n\
         \tfont-style: {style};\n\
         \tfont-weight: {weight};\n\
         \tsrc: local(\"{family}\"), url({url}) format(\"woff2\");\n\
         \tunicode-range: {range_expr};\n\
         }}\n",
        range_expr = result.range_expr
    )
}

/// Writes a stylesheet with `@font-face` rules for all `results`, in order, to the specified path.
/// An existing file is overwritten.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_stylesheet(
    path: &Path,
    metadata: &FontMetadata,
    results: &[SubsetResult],
) -> Result<(), Error> {
    let write = || -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for result in results {
            writer.write_all(render_font_face(metadata, result).as_bytes())?;
        }
        writer.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
    };
    write().map_err(|err| Error::io("writing stylesheet", path, err))?;
    log::info!("Generated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;
    use crate::FontStyle;

    fn latin_result(output_path: impl Into<PathBuf>) -> SubsetResult {
        SubsetResult {
            name: "latin".to_owned(),
            range_expr: "U+0000-00FF".to_owned(),
            output_path: output_path.into(),
            glyph_count: 191,
            mapped_chars: 191,
        }
    }

    #[test]
    fn converting_paths_to_urls() {
        assert_eq!(
            css_url(Path::new("assets/example.latin.woff2")),
            "assets/example.latin.woff2"
        );
        assert_eq!(css_url(Path::new("./assets/a.woff2")), "./assets/a.woff2");
        assert_eq!(css_url(Path::new("../a.woff2")), "../a.woff2");
        assert_eq!(css_url(Path::new("/var/www/a.woff2")), "/var/www/a.woff2");
        let native: PathBuf = ["assets", "fonts", "a.woff2"].iter().collect();
        assert_eq!(css_url(&native), "assets/fonts/a.woff2");
    }

    #[test]
    fn rendering_font_face() {
        let metadata = FontMetadata::from_names("Example Sans", "Regular");
        let rule = render_font_face(&metadata, &latin_result("assets/example.latin.woff2"));
        assert_eq!(
            rule,
            "@font-face {\n\
             \tfont-family: \"Example Sans\";\n\
             \tfont-style: normal;\n\
             \tfont-weight: 400;\n\
             \tsrc: local(\"Example Sans\"), url(assets/example.latin.woff2) format(\"woff2\");\n\
             \tunicode-range: U+0000-00FF;\n\
             }\n"
        );
    }

    #[test]
    fn rendering_font_face_with_overrides() {
        let metadata = FontMetadata::from_names("Example Sans", "Regular")
            .with_style(FontStyle::Italic)
            .with_weight("300");
        let rule = render_font_face(&metadata, &latin_result("assets/example.latin.woff2"));
        assert!(rule.contains("\tfont-style: italic;\n"), "{rule}");
        assert!(rule.contains("\tfont-weight: 300;\n"), "{rule}");
    }

    #[test]
    fn writing_stylesheet_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let css_path = dir.path().join("example.css");
        fs::write(&css_path, "/* stale contents that must be removed */\n".repeat(100)).unwrap();

        let metadata = FontMetadata::from_names("Example Sans", "Bold");
        let mut greek = latin_result("assets/example.greek.woff2");
        greek.name = "greek".to_owned();
        greek.range_expr = "U+0370-03FF".to_owned();
        let results = [latin_result("assets/example.latin.woff2"), greek];

        write_stylesheet(&css_path, &metadata, &results).unwrap();
        let css = fs::read_to_string(&css_path).unwrap();
        assert!(!css.contains("stale"));
        assert_eq!(css.matches("@font-face {").count(), 2);
        let latin_pos = css.find("U+0000-00FF").unwrap();
        let greek_pos = css.find("U+0370-03FF").unwrap();
        assert!(latin_pos < greek_pos);
        assert!(css.contains("\tfont-weight: 700;\n"));

        write_stylesheet(&css_path, &metadata, &results).unwrap();
        assert_eq!(fs::read_to_string(&css_path).unwrap(), css);
    }

    #[test]
    fn empty_results_produce_empty_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let css_path = dir.path().join("example.css");
        let metadata = FontMetadata::from_names("Example Sans", "Regular");
        write_stylesheet(&css_path, &metadata, &[]).unwrap();
        assert_eq!(fs::read_to_string(&css_path).unwrap(), "");
    }
}
