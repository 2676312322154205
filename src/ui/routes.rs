//! Actix web routes for the insurance cost predictor.
//!
//! `GET /` serves the prediction form, `POST /predict` handles one
//! submission (parse, validate, encode, predict, render), and `GET /model`
//! shows metadata about the loaded artifact. Every failure is reported on
//! the page for the triggering request only; the process never exits on a
//! bad submission or a missing artifact.

use actix_web::{web, HttpResponse, Responder};
use html_escape::encode_text;
use log::{info, warn};
use serde::Deserialize;

use crate::artifact::ModelArtifact;
use crate::common::format_currency;
use crate::forest::Regressor;
use crate::profile::{
    PatientProfile, Region, Sex, Smoker, AGE_MAX, AGE_MIN, BMI_MAX, BMI_MIN, CHILDREN_MAX,
};

/// Process-wide read-only state. The artifact is loaded once at startup and
/// shared by every request; when loading failed the server keeps running
/// with prediction disabled and the reason surfaces on the page.
pub struct AppState {
    artifact: Option<ModelArtifact>,
    load_error: Option<String>,
}

impl AppState {
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Some(artifact),
            load_error: None,
        }
    }

    pub fn without_artifact(reason: String) -> Self {
        Self {
            artifact: None,
            load_error: Some(reason),
        }
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_ref()
    }

    fn unavailable_reason(&self) -> &str {
        self.load_error.as_deref().unwrap_or("no model artifact is loaded")
    }
}

/// Raw form fields as submitted. Everything arrives as a string so that a
/// malformed number produces a readable message instead of a bare 400 from
/// the framework's deserializer.
#[derive(Deserialize, Debug)]
pub struct PredictForm {
    age: String,
    sex: String,
    bmi: String,
    children: String,
    smoker: String,
    region: String,
}

impl PredictForm {
    /// Parses and validates the submission into a `PatientProfile`. This is
    /// the form layer's responsibility: anything that reaches the encoder
    /// has already passed these checks.
    fn into_profile(self) -> Result<PatientProfile, String> {
        let age: u32 = self
            .age
            .trim()
            .parse()
            .map_err(|_| format!("age '{}' is not a whole number", self.age.trim()))?;
        let bmi: f64 = self
            .bmi
            .trim()
            .parse()
            .map_err(|_| format!("BMI '{}' is not a number", self.bmi.trim()))?;
        let children: u32 = self
            .children
            .trim()
            .parse()
            .map_err(|_| format!("children '{}' is not a whole number", self.children.trim()))?;
        let sex: Sex = self.sex.trim().parse().map_err(|e| format!("{}", e))?;
        let smoker: Smoker = self.smoker.trim().parse().map_err(|e| format!("{}", e))?;
        let region: Region = self.region.trim().parse().map_err(|e| format!("{}", e))?;

        PatientProfile::new(age, sex, bmi, children, smoker, region).map_err(|e| format!("{}", e))
    }
}

pub async fn index(data: web::Data<AppState>) -> impl Responder {
    let mut body = String::new();
    body.push_str("<h1>Medical Insurance Cost Predictor</h1>");
    body.push_str("<p class=\"subtitle\">Estimate insurance charges from six patient details</p>");

    if data.artifact().is_none() {
        body.push_str(&format!(
            "<div class=\"error-message\">Prediction is currently unavailable: {}</div>",
            encode_text(data.unavailable_reason())
        ));
    }

    body.push_str(&render_form());
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page("Medical Insurance Cost Predictor", &body))
}

pub async fn predict(data: web::Data<AppState>, form: web::Form<PredictForm>) -> HttpResponse {
    let artifact = match data.artifact() {
        Some(artifact) => artifact,
        None => {
            warn!("prediction requested while disabled: {}", data.unavailable_reason());
            return error_page(
                HttpResponse::ServiceUnavailable(),
                &format!("Prediction is currently unavailable: {}", data.unavailable_reason()),
            );
        }
    };

    let profile = match form.into_inner().into_profile() {
        Ok(profile) => profile,
        Err(message) => {
            warn!("rejected submission: {}", message);
            return error_page(HttpResponse::BadRequest(), &message);
        }
    };

    let features = artifact.schema().encode(&profile);
    let estimate = match artifact.forest().predict(features.view()) {
        Ok(estimate) => estimate,
        Err(err) => {
            warn!("prediction failed: {}", err);
            return error_page(
                HttpResponse::InternalServerError(),
                &format!("Prediction failed: {}", err),
            );
        }
    };

    info!(
        "predicted {} for age={} region={}",
        format_currency(estimate),
        profile.age(),
        profile.region().as_str()
    );

    let mut body = String::new();
    body.push_str("<h1>Medical Insurance Cost Predictor</h1>");
    body.push_str(&format!(
        "<div class=\"predict-box\">Estimated Medical Insurance Cost: \
         <span class=\"amount\">${}</span></div>",
        format_currency(estimate)
    ));
    body.push_str("<div class=\"metrics\">");
    body.push_str(&format!("<div class=\"metric\">Age<br><strong>{}</strong></div>", profile.age()));
    body.push_str(&format!("<div class=\"metric\">BMI<br><strong>{:.1}</strong></div>", profile.bmi()));
    body.push_str(&format!(
        "<div class=\"metric\">Smoker<br><strong>{}</strong></div>",
        profile.smoker().as_str()
    ));
    body.push_str("</div>");
    body.push_str("<p><a href=\"/\">Make another prediction</a></p>");

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page("Estimated Cost", &body))
}

pub async fn model_info(data: web::Data<AppState>) -> impl Responder {
    let mut body = String::new();
    body.push_str("<h1>Model Information</h1>");

    match data.artifact() {
        Some(artifact) => {
            body.push_str("<ul>");
            body.push_str(&format!(
                "<li>Model type: {}</li>",
                encode_text(artifact.model_type())
            ));
            body.push_str(&format!(
                "<li>Artifact: {}</li>",
                encode_text(&artifact.source().display().to_string())
            ));
            body.push_str(&format!("<li>Trees: {}</li>", artifact.forest().n_trees()));
            body.push_str(&format!(
                "<li>Encoding: {}</li>",
                artifact.schema().scheme().as_str()
            ));
            body.push_str("</ul>");
            body.push_str("<h2>Feature columns (model order)</h2><ol>");
            for name in artifact.schema().column_names() {
                body.push_str(&format!("<li>{}</li>", encode_text(name)));
            }
            body.push_str("</ol>");
        }
        None => {
            body.push_str(&format!(
                "<div class=\"error-message\">No model loaded: {}</div>",
                encode_text(data.unavailable_reason())
            ));
        }
    }

    body.push_str("<p><a href=\"/\">Back to the form</a></p>");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page("Model Information", &body))
}

/// Registers the three application routes. Shared by the server binary and
/// the route tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/predict", web::post().to(predict))
        .route("/model", web::get().to(model_info));
}

/// Initializes and runs the Actix web server with the loaded (or disabled)
/// model state.
pub async fn run_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    info!("starting server at http://{}/", bind_addr);
    let data = web::Data::new(state);
    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(data.clone())
            .configure(configure)
            .service(actix_files::Files::new("/static", "./static"))
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n\
         </head>\n<body>\n<main class=\"card\">\n{}\n</main>\n</body>\n</html>",
        encode_text(title),
        body
    )
}

fn error_page(mut builder: actix_web::HttpResponseBuilder, message: &str) -> HttpResponse {
    let body = format!(
        "<h1>Medical Insurance Cost Predictor</h1>\
         <div class=\"error-message\">{}</div>\
         <p><a href=\"/\">Back to the form</a></p>",
        encode_text(message)
    );
    builder
        .content_type("text/html; charset=utf-8")
        .body(page("Prediction Error", &body))
}

fn render_form() -> String {
    let mut form = String::new();
    form.push_str("<form action=\"/predict\" method=\"post\">");

    form.push_str(&format!(
        "<label>Age<input type=\"number\" name=\"age\" min=\"{}\" max=\"{}\" value=\"30\" required></label>",
        AGE_MIN, AGE_MAX
    ));
    form.push_str(
        "<label>Sex<select name=\"sex\">\
         <option value=\"male\">Male</option>\
         <option value=\"female\">Female</option>\
         </select></label>",
    );
    form.push_str(&format!(
        "<label>BMI<input type=\"number\" name=\"bmi\" step=\"0.1\" min=\"{}\" max=\"{}\" value=\"25.0\" required></label>",
        BMI_MIN, BMI_MAX
    ));
    form.push_str(&format!(
        "<label>Children<input type=\"number\" name=\"children\" min=\"0\" max=\"{}\" value=\"0\" required></label>",
        CHILDREN_MAX
    ));
    form.push_str(
        "<label>Smoker<select name=\"smoker\">\
         <option value=\"no\">No</option>\
         <option value=\"yes\">Yes</option>\
         </select></label>",
    );
    form.push_str("<label>Region<select name=\"region\">");
    for region in Region::ALL {
        form.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            region.as_str(),
            region.as_str()
        ));
    }
    form.push_str("</select></label>");

    form.push_str("<button type=\"submit\">Predict Cost</button>");
    form.push_str("</form>");
    form.push_str("<p class=\"footer\"><a href=\"/model\">Model information</a></p>");
    form
}
