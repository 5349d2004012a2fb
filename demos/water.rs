use petri_spn::simulator::LogProgress;
use petri_spn::{run_repeated_seeded, summarize, PetriBuilder, Rate, RunSettings, TIME_KEY};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let mut builder = PetriBuilder::new();
    let hydrogen = builder.node_with_label(200, "hydrogen");
    let oxygen = builder.node_with_label(100, "oxygen");
    let water = builder.node_with_label(0, "water");

    builder
        .build_transition("combustion")
        .input_weighted(hydrogen, 2)
        .input(oxygen)
        .output_weighted(water, 2)
        .rate(Rate::MassAction(0.001))
        .build();

    builder
        .build_transition("electrolysis")
        .input_weighted(water, 2)
        .output_weighted(hydrogen, 2)
        .output(oxygen)
        .rate(Rate::custom(|binding| {
            0.05 * binding.get("water").unwrap_or(0) as f64
        }))
        .build();

    let mut network = builder.build()?;

    let settings = RunSettings {
        max_steps: Some(1000),
        max_time: 20.0,
    };
    let runs = run_repeated_seeded(&mut network, 10, &settings, 7, &mut LogProgress)?;

    let summary = summarize(&runs, TIME_KEY, &["hydrogen", "water"], 10)?;
    for (index, time) in summary.x.iter().enumerate() {
        println!(
            "t = {:5.2}  hydrogen {:7.2}  water {:7.2} (± {:.2})",
            time,
            summary.series["hydrogen"].mean[index],
            summary.series["water"].mean[index],
            summary.series["water"].std[index],
        );
    }

    Ok(())
}
