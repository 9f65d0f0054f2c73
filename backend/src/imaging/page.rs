/// Upload page: file picker or drag-and-drop, preview, and a result badge
/// filled from the `/predict` JSON.
pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="es">
<head>
  <meta charset="utf-8" />
  <title>X-Ray Predictor</title>
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <style>
    body{font-family:system-ui,sans-serif;max-width:900px;margin:40px auto;padding:0 16px}
    .drop{border:2px dashed #888;border-radius:12px;padding:30px;text-align:center;margin:16px 0}
    .drop.over{border-color:#1e88e5;background:#f0f7ff}
    .row{display:flex;gap:12px;flex-wrap:wrap;align-items:center}
    button{padding:10px 14px;border:0;border-radius:10px;cursor:pointer}
    .ghost{background:#eee}
    .primary{background:#1e88e5;color:#fff}
    .badge{display:inline-block;padding:4px 8px;border-radius:8px;color:#fff}
    .badge.normal{background:#1e8e3e}
    .badge.finding{background:#d93025}
    #preview img{max-width:75%;max-height:75%;display:block;margin:12px auto;border-radius:10px}
    #result{display:none;margin-top:8px}
  </style>
</head>
<body>
  <h1>Detector de Neumonía</h1>

  <div class="row">
    <input id="file" type="file" accept="image/*" hidden />
    <button class="ghost" id="pick">Subir archivo…</button>
    <button class="primary" id="send">Click para predecir</button>
  </div>

  <div id="drop" class="drop">Arrastra y suelta una imagen aquí</div>
  <div id="preview"></div>

  <h2>Resultado</h2>
  <div id="result"></div>

<script>
document.addEventListener('DOMContentLoaded', () => {
  const drop = document.getElementById('drop');
  const input = document.getElementById('file');
  const preview = document.getElementById('preview');
  const result = document.getElementById('result');
  let selected = null;

  const select = (file) => {
    selected = file || null;
    if (!selected) return;
    preview.replaceChildren();
    const img = document.createElement('img');
    img.src = URL.createObjectURL(selected);
    preview.appendChild(img);
  };

  document.getElementById('pick').addEventListener('click', () => input.click());
  input.addEventListener('change', (e) => select(e.target.files[0]));

  ['dragenter', 'dragover', 'dragleave', 'drop'].forEach((evt) =>
    drop.addEventListener(evt, (e) => { e.preventDefault(); e.stopPropagation(); }));
  ['dragenter', 'dragover'].forEach((evt) =>
    drop.addEventListener(evt, () => drop.classList.add('over')));
  drop.addEventListener('dragleave', () => drop.classList.remove('over'));
  drop.addEventListener('drop', (e) => {
    drop.classList.remove('over');
    select(e.dataTransfer.files[0]);
  });

  document.getElementById('send').addEventListener('click', async () => {
    if (!selected) { alert('Selecciona o arrastra una imagen.'); return; }
    const body = new FormData();
    body.append('file', selected);
    result.style.display = 'block';
    result.textContent = 'Enviando…';
    try {
      const res = await fetch('/predict', { method: 'POST', body });
      const json = await res.json();
      if (!json.ok) { result.textContent = 'Error: ' + json.error; return; }
      const badge = document.createElement('span');
      badge.className = 'badge ' + (json.prediction.toUpperCase() === 'NORMAL' ? 'normal' : 'finding');
      badge.textContent = 'Predicción: ' + json.prediction;
      const confidence = document.createElement('div');
      confidence.textContent = 'Confianza: ' + (json.confidence * 100).toFixed(1) + ' %';
      const file = document.createElement('div');
      file.textContent = 'Archivo: ' + json.filename;
      result.replaceChildren(badge, confidence, file);
    } catch (err) {
      result.textContent = 'Error: ' + err;
    }
  });
});
</script>
</body>
</html>
"#;
