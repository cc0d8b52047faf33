//! Upload page
//!
//! A single static page with a file picker that posts to `/predict` and
//! renders the JSON response.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(upload_page))
}

/// GET /
async fn upload_page() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>spm-mood - Song Mood Predictor</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 720px;
            margin: 40px auto;
            padding: 20px;
            line-height: 1.6;
            background: #1a1a1a;
            color: #e0e0e0;
        }
        h1 { color: #4a9eff; }
        form, .card {
            background: #2a2a2a;
            border-radius: 8px;
            padding: 20px;
            margin: 20px 0;
        }
        button {
            background: #4a9eff;
            color: #fff;
            border: none;
            border-radius: 4px;
            padding: 8px 20px;
            cursor: pointer;
        }
        button:disabled { background: #555; cursor: default; }
        .mood { font-size: 2em; font-weight: bold; text-transform: capitalize; }
        .error { color: #ff6b6b; }
        table { width: 100%; border-collapse: collapse; }
        td { padding: 4px 8px; border-bottom: 1px solid #3a3a3a; }
        td.value { text-align: right; font-family: monospace; }
    </style>
</head>
<body>
    <h1>Song Mood Predictor</h1>
    <form id="upload-form">
        <input type="file" id="file" name="file" accept="audio/*,.wav,.mp3,.ogg,.flac,.m4a" required>
        <button type="submit" id="submit">Predict</button>
    </form>
    <div id="result"></div>

    <script>
        const form = document.getElementById('upload-form');
        const result = document.getElementById('result');
        const submit = document.getElementById('submit');

        function row(name, value) {
            const shown = typeof value === 'number' ? value.toFixed(4) : value;
            return `<tr><td>${name}</td><td class="value">${shown}</td></tr>`;
        }

        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            const input = document.getElementById('file');
            if (!input.files.length) return;

            const body = new FormData();
            body.append('file', input.files[0]);

            submit.disabled = true;
            result.innerHTML = '<div class="card">Analyzing...</div>';

            try {
                const response = await fetch('/predict', { method: 'POST', body });
                const data = await response.json();

                if (!response.ok) {
                    result.innerHTML = `<div class="card error">${response.status}: ${data.detail}</div>`;
                    return;
                }

                const probabilities = Object.entries(data.probabilities)
                    .sort((a, b) => b[1] - a[1])
                    .map(([label, p]) => row(label, p))
                    .join('');
                const features = Object.entries(data.audio_features)
                    .map(([name, v]) => row(name, v))
                    .join('');

                result.innerHTML = `
                    <div class="card"><div class="mood">${data.mood}</div></div>
                    <div class="card"><h3>Probabilities</h3><table>${probabilities}</table></div>
                    <div class="card"><h3>Audio features</h3><table>${features}</table></div>`;
            } catch (err) {
                result.innerHTML = `<div class="card error">Request failed: ${err}</div>`;
            } finally {
                submit.disabled = false;
            }
        });
    </script>
</body>
</html>
"#,
    )
}
