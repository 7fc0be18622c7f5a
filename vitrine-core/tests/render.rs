use std::sync::Arc;
use std::thread;

use serde_json::json;
use vitrine_core::{
    Commit, PageComposer, Preview, PreviewSession, Product, Project, RenderOptions, compose,
    normalize,
};

fn composer() -> PageComposer {
    PageComposer::new(RenderOptions::default()).unwrap()
}

#[test]
fn same_project_renders_identical_markup() {
    let project = Project::starter();
    let first = compose(&project).unwrap();
    let second = compose(&project).unwrap();
    assert_eq!(first, second);
}

#[test]
fn preview_and_export_are_byte_identical() {
    let composer = composer();
    for project in [Project::starter(), Project::default(), normalize(&json!({}))] {
        let preview = composer.preview(&project).unwrap();
        let bundle = composer.bundle(&project).unwrap();
        assert_eq!(preview.html(), bundle.index_html());
    }
}

#[test]
fn normalize_accepts_anything() {
    for raw in [
        json!({}),
        json!(null),
        json!([1, 2, 3]),
        json!("project"),
        json!({ "products": "nope", "theme": 4, "sections": [] }),
        json!({ "products": [null, 7, { "price": { "amount": 3 } }] }),
    ] {
        let project = normalize(&raw);
        let html = compose(&project).unwrap().into_string();
        assert!(html.starts_with("<!DOCTYPE html>"), "{raw}");
        assert!(html.contains("id=\"collections\""), "{raw}");
    }
}

#[test]
fn missing_images_fall_back_to_placeholders() {
    let project = normalize(&json!({
        "name": "Shop",
        "products": [{ "name": "Frame", "price": 10 }],
        "images": { "hero": "" }
    }));
    let html = compose(&project).unwrap().into_string();

    for placeholder in [
        "https://placehold.co/1600x900?text=Hero",
        "https://placehold.co/1200x1400?text=Lifestyle",
        "https://placehold.co/800x600?text=Frame",
        "https://placehold.co/800x1000?text=Lifestyle",
        "https://placehold.co/1000x800?text=Flatlay",
        "https://placehold.co/900x900?text=Closeup",
    ] {
        assert!(html.contains(placeholder), "missing {placeholder}");
    }
    assert!(!html.contains("src=\"\""));
}

#[test]
fn prices_are_formatted_and_clamped() {
    let project = normalize(&json!({
        "products": [
            { "name": "Whole", "price": 420 },
            { "name": "Negative", "price": -5 },
            { "name": "Text", "price": "$19.5" },
            { "name": "Junk", "price": "free" }
        ]
    }));
    let html = compose(&project).unwrap().into_string();

    assert!(html.contains(">$420<"));
    assert!(html.contains(">$19.50<"));
    assert_eq!(html.matches(">$0<").count(), 2);
    assert!(!html.contains("$-5"));
}

#[test]
fn products_render_in_list_order() {
    let card_names = |project: &Project| -> Vec<String> {
        let html = compose(project).unwrap().into_string();
        html.split("<span class=\"vt-card-name\">")
            .skip(1)
            .filter_map(|rest| rest.split('<').next())
            .map(str::to_string)
            .collect()
    };

    let mut project = Project::default();
    assert!(card_names(&project).is_empty());

    project.push_product(Product::new("Only", 1.0));
    assert_eq!(card_names(&project), ["Only"]);

    for name in ["B", "C", "D"] {
        project.push_product(Product::new(name, 1.0));
    }
    project.move_product(3, 0).unwrap();
    assert_eq!(card_names(&project), ["D", "Only", "B", "C"]);
}

#[test]
fn only_the_latest_render_is_displayed() {
    let composer = Arc::new(composer());
    let session = Arc::new(PreviewSession::new());

    let renders: Vec<_> = (0..8)
        .map(|n| {
            let ticket = session.begin();
            let project = Project {
                name: format!("Edit {n}"),
                ..Project::starter()
            };
            (ticket, project)
        })
        .collect();
    let last = renders.last().map(|(ticket, _)| *ticket).unwrap();

    // finish in reverse so the newest result lands first
    let handles: Vec<_> = renders
        .into_iter()
        .rev()
        .map(|(ticket, project)| {
            let composer = Arc::clone(&composer);
            let session = Arc::clone(&session);
            thread::spawn(move || {
                let preview = composer.preview(&project).unwrap();
                (ticket, session.commit(ticket, preview))
            })
        })
        .collect();

    for handle in handles {
        let (ticket, outcome) = handle.join().unwrap();
        if ticket == last {
            assert_eq!(outcome, Commit::Applied);
        } else {
            assert!(matches!(outcome, Commit::Stale { .. }));
        }
    }

    let shown: Preview = session.current().unwrap();
    assert!(shown.html().contains("<title>Edit 7</title>"));
}
