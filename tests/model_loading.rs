mod common;

use common::*;
use jean_o_type::{
    ActivationFunction, Classifier, ImageBatch, LoadStrategy, ModelError, ModelLoader, ModelOutput,
    Network, StyleLabel,
};

fn tiny_batch() -> ImageBatch {
    ImageBatch::single(1, 1, 3, vec![0.2, 0.4, 0.6])
}

fn resolve(loader: &ModelLoader, bytes: &[u8]) -> Vec<f64> {
    let model = loader.load(bytes).unwrap_or_else(|e| panic!("load failed: {}", e));
    model.predict(&tiny_batch()).unwrap().resolve().unwrap()
}

#[test]
fn zipped_model_directory_loads_from_first_entry() {
    let net = constant_network(3, &[0.1, 0.2, 0.3, 0.3, 0.1]);
    let bytes = zip_bytes(&[
        ("jeans_model/", vec![]),
        ("jeans_model/model.json", json(&net)),
        ("jeans_model/notes.txt", b"trained on 5 styles".to_vec()),
    ]);
    let scores = resolve(&ModelLoader::default(), &bytes);
    assert_eq!(scores, vec![0.1, 0.2, 0.3, 0.3, 0.1]);
}

#[test]
fn directory_without_explicit_dir_entry_still_loads() {
    let net = constant_network(3, &[0.0, 1.0]);
    let bytes = zip_bytes(&[("export/model.json", json(&net))]);
    let loader = ModelLoader::new(LoadStrategy::Directory);
    assert_eq!(resolve(&loader, &bytes), vec![0.0, 1.0]);
}

#[test]
fn unrelated_first_entry_is_a_reported_error() {
    let net = constant_network(3, &[0.5, 0.5]);
    let bytes = zip_bytes(&[
        ("README.md", b"# my model".to_vec()),
        ("model.json", json(&net)),
    ]);
    let err = ModelLoader::new(LoadStrategy::Directory).load(&bytes).err().unwrap();
    assert!(matches!(err, ModelError::NotAModel(ref name) if name == "README.md"), "{}", err);
}

#[test]
fn single_file_strategy_finds_first_json_anywhere() {
    let net = constant_network(3, &[0.7, 0.3]);
    let bytes = zip_bytes(&[
        ("README.md", b"# my model".to_vec()),
        ("weights/", vec![]),
        ("weights/jeans.json", json(&net)),
    ]);
    let loader = ModelLoader::new(LoadStrategy::SingleFile);
    assert_eq!(resolve(&loader, &bytes), vec![0.7, 0.3]);
}

#[test]
fn auto_falls_back_to_single_file_for_flat_archives() {
    let net = constant_network(3, &[0.25, 0.75]);
    let bytes = zip_bytes(&[("notes.txt", b"x".to_vec()), ("jeans.json", json(&net))]);
    assert_eq!(resolve(&ModelLoader::default(), &bytes), vec![0.25, 0.75]);
}

#[test]
fn tar_gz_directory_model_loads() {
    let net = constant_network(3, &[0.9, 0.1]);
    let bytes = tar_gz_bytes(&[("bundle/model.json", json(&net))]);
    assert_eq!(resolve(&ModelLoader::default(), &bytes), vec![0.9, 0.1]);
}

#[test]
fn tar_made_from_inside_the_model_folder_loads() {
    // `tar -C export -czf model.tgz .` lists `./` first.
    let net = constant_network(3, &[0.4, 0.6]);
    let bytes = tar_gz_bytes(&[
        ("./", vec![]),
        ("./model.json", json(&net)),
        ("./notes.txt", b"v2".to_vec()),
    ]);
    assert_eq!(resolve(&ModelLoader::default(), &bytes), vec![0.4, 0.6]);
    assert_eq!(resolve(&ModelLoader::new(LoadStrategy::Directory), &bytes), vec![0.4, 0.6]);
}

#[test]
fn tar_with_only_a_root_entry_is_empty() {
    let bytes = tar_gz_bytes(&[("./", vec![])]);
    let err = ModelLoader::default().load(&bytes).err().unwrap();
    assert!(matches!(err, ModelError::EmptyArchive), "{}", err);
}

#[test]
fn serving_bundle_returns_named_outputs_in_declared_order() {
    let probs = constant_network(3, &[0.1, 0.1, 0.6, 0.1, 0.1]);
    let logits = constant_network(3, &[5.0, 0.0, 0.0, 0.0, 0.0]);
    let manifest = br#"{
        "signatures": [
            { "name": "debug", "outputs": [ { "name": "logits", "model": "logits.json" } ] },
            { "name": "serving_default", "outputs": [
                { "name": "probabilities", "model": "heads/probs.json" },
                { "name": "logits", "model": "logits.json" }
            ] }
        ]
    }"#;
    let bytes = zip_bytes(&[
        ("saved/", vec![]),
        ("saved/signatures.json", manifest.to_vec()),
        ("saved/heads/probs.json", json(&probs)),
        ("saved/logits.json", json(&logits)),
    ]);

    let model = ModelLoader::default().load(&bytes).unwrap_or_else(|e| panic!("{}", e));
    match model.predict(&tiny_batch()).unwrap() {
        ModelOutput::Named(outputs) => {
            let names: Vec<&str> = outputs.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["probabilities", "logits"]);
        }
        other => panic!("expected named outputs, got {:?}", other),
    }

    let p = Classifier::new(model.as_ref()).classify_batch(&tiny_batch()).unwrap();
    assert_eq!(p.primary.style(), Some(StyleLabel::Skinny));

    let debug = ModelLoader::default().with_endpoint("debug").load(&bytes).unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(debug.predict(&tiny_batch()).unwrap().resolve().unwrap()[0], 5.0);
}

#[test]
fn unknown_endpoint_lists_what_exists() {
    let net = constant_network(3, &[1.0, 0.0]);
    let manifest = br#"{"signatures":[{"name":"serving_default","outputs":[{"name":"out","model":"m.json"}]}]}"#;
    let bytes = zip_bytes(&[("signatures.json", manifest.to_vec()), ("m.json", json(&net))]);
    let err = ModelLoader::default().with_endpoint("predict").load(&bytes).err().unwrap();
    match err {
        ModelError::EndpointNotFound { endpoint, available } => {
            assert_eq!(endpoint, "predict");
            assert_eq!(available, vec!["serving_default"]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn manifest_paths_cannot_escape_the_bundle() {
    let manifest = br#"{"signatures":[{"name":"serving_default","outputs":[{"name":"out","model":"../m.json"}]}]}"#;
    let bytes = zip_bytes(&[("signatures.json", manifest.to_vec())]);
    let err = ModelLoader::default().load(&bytes).err().unwrap();
    assert!(matches!(err, ModelError::UnsafePath(_)), "{}", err);
}

#[test]
fn corrupt_zip_is_reported_not_panicked() {
    let mut bytes = zip_bytes(&[("model.json", b"{}".to_vec())]);
    bytes.truncate(12);
    assert!(ModelLoader::default().load(&bytes).is_err());
}

#[test]
fn bundled_labels_override_the_built_in_list() {
    let net = with_labels(constant_network(3, &[0.2, 0.8]), &["Flare", "Cargo"]);
    let model = ModelLoader::default().load(&json(&net)).unwrap_or_else(|e| panic!("{}", e));
    let classifier = Classifier::new(model.as_ref());
    assert_eq!(classifier.labels(), &["Flare".to_string(), "Cargo".to_string()]);
    let p = classifier.classify_batch(&tiny_batch()).unwrap();
    assert_eq!(p.primary.label, "Cargo");
    assert_eq!(p.primary.style(), None);
}

#[test]
fn output_length_mismatch_fails_fast() {
    let net = constant_network(3, &[0.2, 0.3, 0.5]);
    let model = ModelLoader::default().load(&json(&net)).unwrap_or_else(|e| panic!("{}", e));
    let err = Classifier::new(model.as_ref()).classify_batch(&tiny_batch()).unwrap_err();
    assert!(err.to_string().contains("3 scores but there are 5 labels"), "{}", err);
}

#[test]
fn wrong_input_size_is_an_inference_error() {
    let net = Network::new(vec![(5, 10, ActivationFunction::Softmax)]);
    let model = ModelLoader::default().load(&json(&net)).unwrap_or_else(|e| panic!("{}", e));
    let err = model.predict(&tiny_batch()).err().unwrap();
    assert!(matches!(err, ModelError::Inference(_)));
}

#[test]
fn photo_to_prediction_end_to_end() {
    // Zero weights: the output is the bias vector, so Bootcut must win and
    // Skinny must be runner-up regardless of the pixels.
    let net = constant_network(IMAGE_INPUT, &[0.05, 0.55, 0.25, 0.10, 0.05]);
    let bytes = zip_bytes(&[("jeans/", vec![]), ("jeans/model.json", json(&net))]);
    let model = ModelLoader::default().load(&bytes).unwrap_or_else(|e| panic!("{}", e));

    let photo = png_bytes(320, 480, [40, 60, 160]);
    let p = Classifier::new(model.as_ref()).classify_bytes(&photo).unwrap();

    assert_eq!(p.primary.style(), Some(StyleLabel::Bootcut));
    assert_eq!(p.secondary.style(), Some(StyleLabel::Skinny));
    assert_eq!(p.primary.confidence, 0.55 * 100.0);
    assert_eq!(p.secondary.confidence, 0.25 * 100.0);
}
