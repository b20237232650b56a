use std::path::Path;

use color_eyre::{
    Result,
    eyre::{WrapErr, bail},
};
use log::info;

use fundus_grader::common::Grade;
use fundus_grader::{load_model, predict};

struct AppPaths {
    model_path: String,
}

impl AppPaths {
    fn from_env() -> Self {
        Self {
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/trained_model.pth".into()),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let Some(image_path) = std::env::args().nth(1) else {
        bail!("usage: fundus-grader <image-file>");
    };

    type Backend = burn::backend::NdArray;
    let device = Default::default();

    let paths = AppPaths::from_env();
    let model = load_model::<Backend>(Path::new(&paths.model_path), Grade::ALL.len(), &device)
        .wrap_err("failed to load model; refusing to serve")?;

    let bytes = std::fs::read(&image_path)
        .wrap_err_with(|| format!("failed to read image file {image_path}"))?;
    let result = predict(&model, &bytes, &device)?;
    info!("prediction: {} ({:.4})", result.grade.label(), result.confidence);

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
