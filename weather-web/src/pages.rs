//! HTML pages rendered with tera.
//!
//! Templates are compiled into the binary so the server needs no template
//! directory at runtime.

use serde_json::json;
use tera::{Context, Tera};
use weather_core::{ChartField, HistoryRow};

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html.tera")),
    ("index.html", include_str!("../templates/index.html.tera")),
    ("history.html", include_str!("../templates/history.html.tera")),
    ("graphs.html", include_str!("../templates/graphs.html.tera")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    History,
    Graphs,
}

impl Page {
    fn template(&self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::History => "history.html",
            Page::Graphs => "graphs.html",
        }
    }
}

#[derive(Debug)]
pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    /// Render `page` over the current history, newest lookup first.
    pub fn render(&self, page: Page, rows: &[HistoryRow]) -> Result<String, tera::Error> {
        let newest_first: Vec<&HistoryRow> = rows.iter().rev().collect();

        let mut ctx = Context::new();
        ctx.insert("weather_history", &newest_first);
        ctx.insert("total", &rows.len());
        ctx.insert(
            "fields",
            &ChartField::all()
                .iter()
                .map(|f| json!({ "name": f.as_str(), "title": f.title() }))
                .collect::<Vec<_>>(),
        );

        self.tera.render(page.template(), &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(city: &str) -> HistoryRow {
        HistoryRow {
            city: city.into(),
            temperature: "18.2".into(),
            humidity: "55".into(),
            wind_speed: "3".into(),
            date: "2024-03-03".into(),
            time: "11:00:00".into(),
            description: "few clouds".into(),
            icon: "02d".into(),
        }
    }

    #[test]
    fn every_page_renders_empty_history() {
        let pages = Pages::new().unwrap();
        for page in [Page::Index, Page::History, Page::Graphs] {
            let html = pages.render(page, &[]).unwrap();
            assert!(html.contains("<html"));
        }
    }

    #[test]
    fn history_page_lists_rows_newest_first() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(Page::History, &[row("Berlin"), row("Vienna")])
            .unwrap();

        let vienna = html.find("Vienna").unwrap();
        let berlin = html.find("Berlin").unwrap();
        assert!(vienna < berlin);
    }

    #[test]
    fn city_names_are_escaped() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(Page::Index, &[row("<script>alert(1)</script>")])
            .unwrap();
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;alert(1)"));
    }

    #[test]
    fn graphs_page_offers_every_field() {
        let pages = Pages::new().unwrap();
        let html = pages.render(Page::Graphs, &[row("Rome")]).unwrap();
        for field in ChartField::all() {
            assert!(html.contains(field.as_str()));
        }
    }
}
