use rand::SeedableRng;
use rand::rngs::StdRng;

use tarpit_core::generators::content::{LinkSettings, random_link};
use tarpit_core::generators::corpus::WordCorpus;
use tarpit_core::generators::script::{ObfuscationStrategy, js_interactive_content};
use tarpit_core::generators::structure::nest_divs;
use tarpit_core::generators::svg::random_svg;
use tarpit_core::generators::text::{ParagraphShape, markov_paragraphs};
use tarpit_core::macros::{MacroContext, RenderData, Template};
use tarpit_core::model::{ModelStore, TrainingOptions};

const CORPUS: &str = "The library opens at nine. The library closes at six on weekdays. \
    Visitors may borrow four books at a time. Visitors must return books within three weeks. \
    The reading room is quiet. The reading room opens at ten on weekends. \
    Late books cost a small fee. The front desk renews books on request.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // A fixed seed makes every run print the same output
    let mut rng = StdRng::seed_from_u64(42);

    // The embedded word list feeds the structural and link generators
    let corpus = WordCorpus::embedded();
    println!("Corpus holds {} words", corpus.len());

    // Train a Markov chain; the order is picked from the corpus size
    // (highest order with enough samples per state, capped at max_order)
    let store = ModelStore::empty();
    log::info!("Training on {} bytes of text", CORPUS.len());
    let chain = store.retrain(CORPUS, &TrainingOptions::default());
    println!("Trained order {} chain with {} states", chain.order(), chain.state_count());

    // Training again extends the current chain instead of replacing it
    let chain = store.retrain("The archive opens at noon.", &TrainingOptions::default());
    println!("Retrained chain has {} states", chain.state_count());

    // Two short paragraphs of generated text
    let shape = ParagraphShape {
        count: 2,
        min_sentences: 2,
        max_sentences: 4,
        min_words: 5,
        max_words: 12,
    };
    println!("\n{}\n", markov_paragraphs(&mut rng, Some(&chain), shape));

    // Each generator can be called directly
    println!("{}", nest_divs(&mut rng, &corpus, 3));
    println!("{}", random_svg(&mut rng, "fractal"));
    println!("{}", random_link(&mut rng, &corpus, &LinkSettings::default()));

    // Obfuscated content is only revealed once the script runs in a browser
    println!("{}", js_interactive_content(&mut rng, "p", "Only visible with JavaScript"));
    let strategy = ObfuscationStrategy::random(&mut rng);
    let encoded = strategy.encode("round trip");
    println!("{strategy:?}: {encoded} -> {:?}", strategy.decode(&encoded));

    // Templates resolve function names when compiled, so errors show up early
    match Template::compile("broken.html", "{{ nestDivs }}") {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Rejected: {e}"),
    }

    // Render the sample template at two aggression levels
    log::info!("Rendering ./templates/article.html");
    let source = std::fs::read_to_string("./templates/article.html")?;
    let template = Template::compile("article.html", &source)?;
    let links = LinkSettings::default();
    for aggression in [0, 3] {
        let mut ctx = MacroContext {
            rng: &mut rng,
            corpus: &corpus,
            model: Some(&chain),
            links: &links,
        };
        let page = template.render(&mut ctx, &RenderData { aggression })?;
        let preview: String = page.chars().take(40).collect();
        log::debug!("Page at aggression {aggression} starts with {preview:?}");
        println!("Aggression {aggression}: {} bytes", page.len());
    }

    Ok(())
}
