use ag_notebook::Notebook;
use serde_json::json;

fn sample() -> serde_json::Value {
    json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"assignment_id": "hw1", "kernelspec": {"name": "python3"}},
        "cells": [
            {
                "cell_type": "markdown",
                "id": "abc123",
                "metadata": {},
                "source": ["# Exercise 1\n", "Do the thing."]
            },
            {
                "cell_type": "code",
                "metadata": {"exercise_id": "ex1"},
                "execution_count": 3,
                "outputs": [{"output_type": "stream", "name": "stdout", "text": ["1\n", "2\n"]}],
                "source": "def f():\n    return 1\n"
            }
        ]
    })
}

#[test]
fn parse_joins_source_and_keeps_opaque_keys() {
    let nb = Notebook::from_value(sample()).unwrap();
    assert_eq!(nb.assignment_id(), Some("hw1"));
    assert_eq!(nb.cells.len(), 2);
    assert_eq!(nb.cells[0].source, "# Exercise 1\nDo the thing.");
    assert_eq!(nb.cells[0].extra.get("id").unwrap(), "abc123");
    assert_eq!(nb.cells[1].exercise_id(), Some("ex1"));
    assert_eq!(nb.cells[1].source, "def f():\n    return 1\n");
    let outputs = nb.cells[1].outputs.as_ref().unwrap();
    assert_eq!(outputs.get("stdout").unwrap(), "1\n2\n");
}

#[test]
fn roundtrip_is_stable_cell_for_cell() {
    let nb = Notebook::from_value(sample()).unwrap();
    let emitted = nb.emit();
    let nb2 = Notebook::parse(&emitted).unwrap();

    assert_eq!(nb.cells.len(), nb2.cells.len());
    for (a, b) in nb.cells.iter().zip(nb2.cells.iter()) {
        assert_eq!(a.cell_type, b.cell_type);
        assert_eq!(a.metadata, b.metadata);
        assert_eq!(a.source, b.source);
    }
    assert_eq!(nb.metadata, nb2.metadata);
}

#[test]
fn cell_without_source_or_metadata_is_empty() {
    let raw = json!({
        "nbformat": 4, "nbformat_minor": 5, "metadata": {},
        "cells": [{"cell_type": "code"}]
    });
    let nb = Notebook::from_value(raw).unwrap();
    assert_eq!(nb.cells[0].source, "");
    assert!(nb.cells[0].metadata.is_empty());
}

#[test]
fn unknown_top_level_keys_are_dropped_on_emit() {
    let raw = json!({
        "nbformat": 4, "nbformat_minor": 5, "metadata": {}, "cells": [],
        "some_vendor_extension": {"whatever": true}
    });
    let nb = Notebook::from_value(raw).unwrap();
    let emitted: serde_json::Value = serde_json::from_slice(&nb.emit()).unwrap();
    assert!(emitted.get("some_vendor_extension").is_none());
}
