//! Server-rendered HTML for the public pet page.
//!
//! The page is what a printed QR code opens, so it must work without any
//! client-side framework. A short script asks the browser for its position
//! and posts it to the report endpoint; the response carries the refreshed
//! contact link and location, which the script swaps in.

use std::fmt::Write;

use pawtag_shared::constants::APP_NAME;
use pawtag_shared::{LocationSample, PetInfoView, PetRecord};

/// Endpoint the page script posts positions to.
pub const REPORT_PATH: &str = "/api/pet-info/location";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f5f7fa; margin: 0; padding: 2rem 1rem; }
main { max-width: 28rem; margin: 0 auto; background: #fff; border-radius: 12px; box-shadow: 0 2px 12px rgba(0,0,0,.08); padding: 1.5rem; }
h1 { text-align: center; color: #2563eb; font-size: 1.5rem; }
h2 { font-size: 1rem; color: #2563eb; margin: 1rem 0 .25rem; }
p { margin: 0; font-size: 1.1rem; }
.reward { border: 2px solid #22c55e; background: #f0fdf4; border-radius: 8px; text-align: center; padding: 1rem; }
.reward strong { display: block; font-size: 1.5rem; color: #16a34a; }
.photo { display: block; max-width: 100%; border-radius: 8px; margin: 0 auto 1rem; }
.contact { display: block; margin-top: 1.5rem; padding: .9rem; text-align: center; background: #22c55e; color: #fff; border-radius: 8px; text-decoration: none; font-size: 1.1rem; }
.muted { color: #6b7280; font-size: .9rem; }
ul { list-style: none; padding: 0; }
li { display: flex; justify-content: space-between; padding: .5rem 0; border-bottom: 1px solid #eee; }
"#;

const SCRIPT: &str = r#"
(function () {
  var qrId = document.body.dataset.qrId;
  var status = document.getElementById("location-status");
  function report(body) {
    body.qr_id = qrId;
    return fetch(REPORT_PATH, {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify(body)
    }).then(function (res) { return res.ok ? res.json() : null; });
  }
  function show(view) {
    if (!view || view.state !== "found") { return; }
    document.getElementById("contact").href = view.contact_link;
    var loc = view.user_location;
    if (loc.city) {
      status.textContent = loc.city + (loc.country ? ", " + loc.country : "");
    } else if (loc.latitude === null) {
      status.textContent = "Não foi possível determinar sua localização.";
    } else {
      status.textContent = "Localização registrada.";
    }
  }
  if (!("geolocation" in navigator)) {
    report({}).then(show);
    return;
  }
  status.textContent = "Obtendo sua localização...";
  navigator.geolocation.getCurrentPosition(
    function (pos) {
      report({ latitude: pos.coords.latitude, longitude: pos.coords.longitude }).then(show);
    },
    function () { report({}).then(show); }
  );
})();
"#;

/// Render the page for a resolved record.
pub fn render_pet_page(view: &PetInfoView) -> Option<String> {
    let PetInfoView::Found {
        pet,
        location_history,
        contact_link,
        ..
    } = view
    else {
        return None;
    };

    let mut body = String::new();

    if let Some(photo) = &pet.photo_url {
        let _ = write!(
            body,
            r#"<img class="photo" src="{}" alt="{}">"#,
            escape(photo),
            escape(&pet.pet_name)
        );
    }

    if let Some(reward) = pet.reward_label() {
        let _ = write!(
            body,
            r#"<div class="reward">Recompensa<strong>{}</strong></div>"#,
            escape(&reward)
        );
    }

    push_field(&mut body, "Nome do Pet", Some(&pet.pet_name));
    push_field(&mut body, "Nome do Tutor", Some(&pet.owner_name));
    push_field(&mut body, "Endereço", pet.address.as_deref());
    push_field(&mut body, "Telefone", Some(&pet.phone));
    push_field(&mut body, "Observações", pet.notes.as_deref());

    body.push_str(r#"<h2>Localização Atual</h2><p id="location-status" class="muted"></p>"#);

    if !location_history.is_empty() {
        body.push_str("<h2>Histórico de Localizações</h2><ul>");
        for sample in &location_history.locations {
            push_history_entry(&mut body, sample);
        }
        body.push_str("</ul>");
    }

    let _ = write!(
        body,
        r#"<a id="contact" class="contact" href="{}" target="_blank" rel="noopener">Contatar via WhatsApp</a>"#,
        escape(contact_link)
    );

    Some(layout(
        &format!("{} - {}", pet.pet_name, APP_NAME),
        Some(pet),
        &body,
    ))
}

/// Shown for missing, malformed or unknown codes.
pub fn render_invalid_page() -> String {
    layout(
        &format!("QR Code inválido - {APP_NAME}"),
        None,
        r#"<p class="muted" style="text-align:center">QR Code inválido</p>"#,
    )
}

fn push_field(body: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = write!(body, "<h2>{}</h2><p>{}</p>", label, escape(value));
    }
}

fn push_history_entry(body: &mut String, sample: &LocationSample) {
    let place = sample
        .place_label()
        .unwrap_or_else(|| "Local desconhecido".to_string());
    let _ = write!(
        body,
        r#"<li><span>{}<br><span class="muted">{}</span></span>"#,
        escape(&place),
        sample.timestamp.format("%d/%m/%Y %H:%M UTC")
    );
    if let Some(link) = sample.map_link() {
        let _ = write!(
            body,
            r#"<a href="{}" target="_blank" rel="noopener">Ver no Mapa</a>"#,
            escape(&link)
        );
    }
    body.push_str("</li>");
}

fn layout(title: &str, pet: Option<&PetRecord>, content: &str) -> String {
    let (data_attr, script) = match pet {
        Some(pet) => (
            format!(r#" data-qr-id="{}""#, escape(pet.qr_id.as_str())),
            format!(
                "<script>{}</script>",
                SCRIPT.replace("REPORT_PATH", &format!("\"{REPORT_PATH}\""))
            ),
        ),
        None => (String::new(), String::new()),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body{data_attr}>
<main>
<h1>Informações do Pet</h1>
{content}
</main>
{script}
</body>
</html>
"#,
        title = escape(title),
    )
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
