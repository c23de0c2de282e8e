use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>SpeakingDoc</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem; color: #1d1d1f; }
    h1 { margin-bottom: 0.25rem; }
    h2.ask { color: #1a7f37; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; max-width: 720px; }
    .hidden { display: none; }
    input[type=text] { width: 100%; padding: 0.5rem; }
    button { margin-top: 1rem; margin-right: 0.5rem; padding: 0.6rem 1rem; }
    pre { background: #f6f8fa; padding: 1rem; white-space: pre-wrap; }
  </style>
</head>
<body>
  <h1>SpeakingDoc</h1>
  <p>Chat with any document</p>

  <div id="homeScreen" class="card">
    <label for="fileInput">Upload a PDF, DOCX or TXT file</label><br />
    <input id="fileInput" type="file" accept=".pdf,.docx,.txt" />
    <div id="uploadStatus"></div>
    <button id="chatBtn" class="hidden">Chat</button>
  </div>

  <div id="chatScreen" class="card hidden">
    <h2 class="ask">Ask any doc related question</h2>
    <input id="question" type="text" placeholder="Type here:" />
    <button id="sendBtn">Send</button>
    <button id="homeBtn">Back to home</button>
    <pre id="transcript"></pre>
  </div>

  <script>
    const fileInput = document.getElementById('fileInput');
    const uploadStatus = document.getElementById('uploadStatus');
    const chatBtn = document.getElementById('chatBtn');
    const homeScreen = document.getElementById('homeScreen');
    const chatScreen = document.getElementById('chatScreen');
    const transcript = document.getElementById('transcript');
    let fileId = null;

    fileInput.addEventListener('change', async () => {
      chatBtn.classList.add('hidden');
      fileId = null;
      if (!fileInput.files.length) {
        return;
      }
      const formData = new FormData();
      formData.append('file', fileInput.files[0]);
      uploadStatus.textContent = 'Uploading...';
      const res = await fetch('/api/files', { method: 'POST', body: formData });
      const json = await res.json();
      if (res.ok) {
        fileId = json.file_id;
        uploadStatus.textContent = json.message;
        chatBtn.classList.remove('hidden');
      } else {
        uploadStatus.textContent = json.error;
      }
    });

    chatBtn.addEventListener('click', () => {
      homeScreen.classList.add('hidden');
      chatScreen.classList.remove('hidden');
    });

    document.getElementById('sendBtn').addEventListener('click', async () => {
      const message = document.getElementById('question').value;
      transcript.textContent = 'You:\n' + message + '\n\nAssistant:\n';
      const res = await fetch('/api/chat', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ file_id: fileId, message })
      });
      const reader = res.body.getReader();
      const decoder = new TextDecoder();
      for (;;) {
        const { done, value } = await reader.read();
        if (done) break;
        transcript.textContent += decoder.decode(value, { stream: true });
      }
    });

    document.getElementById('homeBtn').addEventListener('click', async () => {
      if (fileId) {
        await fetch('/api/files/' + encodeURIComponent(fileId), { method: 'DELETE' });
      }
      fileId = null;
      fileInput.value = '';
      uploadStatus.textContent = '';
      transcript.textContent = '';
      chatBtn.classList.add('hidden');
      chatScreen.classList.add('hidden');
      homeScreen.classList.remove('hidden');
    });
  </script>
</body>
</html>"#;
