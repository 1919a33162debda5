use insta::assert_snapshot;
use ngextract::app::naming::{self, NamingOptions};
use ngextract::app::synthesize::{SynthesizeOptions, Synthesizer};
use ngextract::domain::model::Identifier;

#[test]
fn angular_component_renders() {
    let names = naming::derive(
        &Identifier::parse("foo-bar").unwrap(),
        &NamingOptions::default(),
    );
    let content = Synthesizer::new()
        .unwrap()
        .synthesize(&names, "<p>Hello</p>", &SynthesizeOptions::default())
        .unwrap();
    assert_snapshot!("angular_component", content);
}
