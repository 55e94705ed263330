use rand::SeedableRng;
use rand::rngs::StdRng;

use tarpit_core::generators::content::LinkSettings;
use tarpit_core::generators::corpus::WordCorpus;
use tarpit_core::macros::{MacroContext, RenderData, Template};
use tarpit_core::model::{MarkovChain, ModelStore, TrainingOptions};

const ARTICLE: &str = include_str!("../../templates/article.html");

const CORPUS: &str = "The spider waits in the web. The web is wide and the spider is patient. \
	A crawler walks into the web. The crawler reads every page of the web. \
	Every page leads to another page. The spider is patient and the crawler is tired.";

fn render(template: &Template, model: Option<&MarkovChain>, seed: u64, aggression: i64) -> String {
	let mut rng = StdRng::seed_from_u64(seed);
	let corpus = WordCorpus::embedded();
	let links = LinkSettings::default();
	let mut ctx = MacroContext { rng: &mut rng, corpus: &corpus, model, links: &links };
	template.render(&mut ctx, &RenderData { aggression }).unwrap()
}

#[test]
fn shipped_template_compiles_and_renders() {
	let template = Template::compile("article.html", ARTICLE).unwrap();
	let store = ModelStore::empty();
	store.retrain(CORPUS, &TrainingOptions::default());
	let model = store.current();

	let calm = render(&template, model.as_deref(), 1, 0);
	assert!(calm.starts_with("<!DOCTYPE html>"));
	assert!(calm.contains("Posted by"));
	assert!(!calm.contains("<script>"));

	let angry = render(&template, model.as_deref(), 1, 3);
	assert!(angry.contains("<script>(function(){"));
	assert!(angry.contains("<svg"));
	assert!(angry.matches("<section").count() > calm.matches("<section").count());
}

#[test]
fn same_seed_same_page() {
	let template = Template::compile("article.html", ARTICLE).unwrap();
	let mut chain = MarkovChain::new(1);
	chain.add_corpus(CORPUS);

	let first = render(&template, Some(&chain), 99, 1);
	let second = render(&template, Some(&chain), 99, 1);
	assert_eq!(first, second);
	assert_ne!(first, render(&template, Some(&chain), 100, 1));
}

#[test]
fn persisted_model_feeds_templates() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("markov.bin");
	MarkovChain::train(CORPUS, &TrainingOptions::default()).save(&path).unwrap();

	let store = ModelStore::load_or_empty(&path);
	let model = store.current();
	assert!(model.is_some());

	let template = Template::compile("one", "{{ markovSentence 30 }}").unwrap();
	let sentence = render(&template, model.as_deref(), 5, 0);
	assert!(sentence.ends_with('.'));
	assert!(sentence.split_whitespace().count() <= 30);
}
