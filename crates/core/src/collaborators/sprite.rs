//! SVG symbol sprite packer
//!
//! Every icon becomes a `<symbol>` whose id is the icon name and whose
//! `viewBox` is taken from the icon (or built from its width and height),
//! widened by the configured padding. Width and height attributes are not
//! carried over, so icons size to their container. The optional example page
//! shows each symbol scaled to fit the configured maximum dimensions.

use std::fmt::Write as _;
use std::path::PathBuf;

use sluice_plugin_protocol::{
    CollaboratorError, CollaboratorResult, SpriteAsset, SpriteGenerator, SpriteOptions, SvgSource,
};

const TOOL: &str = "svg-sprite";

#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolSpriteGenerator;

struct Symbol<'a> {
    id: &'a str,
    view_box: [f64; 4],
    body: &'a str,
}

impl SpriteGenerator for SymbolSpriteGenerator {
    fn name(&self) -> &str {
        TOOL
    }

    fn pack(&self, icons: &[SvgSource], options: &SpriteOptions) -> CollaboratorResult<SpriteAsset> {
        let symbols = icons
            .iter()
            .map(|icon| parse_icon(icon, f64::from(options.padding)))
            .collect::<CollaboratorResult<Vec<_>>>()?;

        let mut sprite = String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
        );
        for symbol in &symbols {
            let _ = write!(
                sprite,
                r#"<symbol id="{}" viewBox="{}">{}</symbol>"#,
                symbol.id,
                format_view_box(symbol.view_box),
                symbol.body
            );
        }
        sprite.push_str("</svg>");

        let dest = PathBuf::from(&options.dest);
        let example = options.example.then(|| {
            let stem = options
                .sprite
                .strip_suffix(".svg")
                .unwrap_or(&options.sprite);
            (
                dest.join(format!("{}.symbol.html", stem)),
                example_page(&symbols, options),
            )
        });

        Ok(SpriteAsset {
            path: dest.join(&options.sprite),
            contents: sprite,
            example,
        })
    }
}

fn parse_icon<'a>(icon: &'a SvgSource, padding: f64) -> CollaboratorResult<Symbol<'a>> {
    let reject = |message: &str| CollaboratorError::rejected(TOOL, format!("{}: {}", icon.name, message));

    let contents = icon.contents.as_str();
    let open = contents.find("<svg").ok_or_else(|| reject("no <svg> element"))?;
    let tag_end = contents[open..]
        .find('>')
        .map(|i| open + i)
        .ok_or_else(|| reject("unterminated <svg> tag"))?;
    let tag = &contents[open..tag_end];
    let close = contents.rfind("</svg>").ok_or_else(|| reject("missing </svg>"))?;
    if close < tag_end {
        return Err(reject("missing </svg>"));
    }

    let view_box = match attribute(tag, "viewBox") {
        Some(value) => {
            let numbers: Vec<f64> = value
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| part.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| reject("invalid viewBox"))?;
            <[f64; 4]>::try_from(numbers).map_err(|_| reject("invalid viewBox"))?
        }
        None => {
            let width = attribute(tag, "width").and_then(length);
            let height = attribute(tag, "height").and_then(length);
            match (width, height) {
                (Some(w), Some(h)) => [0.0, 0.0, w, h],
                _ => return Err(reject("no viewBox and no width/height")),
            }
        }
    };

    let [x, y, w, h] = view_box;
    let body = contents[tag_end + 1..close].trim();
    Ok(Symbol {
        id: &icon.name,
        view_box: [x - padding, y - padding, w + 2.0 * padding, h + 2.0 * padding],
        body,
    })
}

/// Value of `name` in an opening tag: whitespace before the name, optional
/// whitespace around `=`, single or double quotes
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(found) = tag[from..].find(name) {
        let start = from + found;
        from = start + name.len();
        let preceded_by_space = tag[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if !preceded_by_space {
            continue;
        }
        let rest = tag[from..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value = &rest[1..];
        return value.find(quote).map(|end| &value[..end]);
    }
    None
}

/// `24`, `24px` and `24.5` all read as pixels
fn length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

fn format_view_box(view_box: [f64; 4]) -> String {
    view_box
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Size an icon is shown at: scaled down to fit the maximum box, never up
fn fit(view_box: [f64; 4], options: &SpriteOptions) -> (f64, f64) {
    let [_, _, w, h] = view_box;
    if w <= 0.0 || h <= 0.0 {
        return (f64::from(options.max_width), f64::from(options.max_height));
    }
    let scale = (f64::from(options.max_width) / w)
        .min(f64::from(options.max_height) / h)
        .min(1.0);
    ((w * scale).round(), (h * scale).round())
}

fn example_page(symbols: &[Symbol<'_>], options: &SpriteOptions) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>SVG symbol sprite</title>\n</head>\n<body>\n<ul>\n",
    );
    for symbol in symbols {
        let (width, height) = fit(symbol.view_box, options);
        let _ = writeln!(
            page,
            "<li><svg width=\"{w}\" height=\"{h}\"><use xlink:href=\"{sprite}#{id}\"></use></svg> {id}</li>",
            w = width,
            h = height,
            sprite = options.sprite,
            id = symbol.id,
        );
    }
    page.push_str("</ul>\n</body>\n</html>\n");
    page
}
