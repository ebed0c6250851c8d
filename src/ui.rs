use crate::models::ViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Progress is loaded; show the day cards.
    Tracking,
    /// Remote backend; show the sign-in form until the page holds a token.
    SignIn,
}

impl PageMode {
    fn as_str(self) -> &'static str {
        match self {
            PageMode::Tracking => "tracking",
            PageMode::SignIn => "sign-in",
        }
    }
}

pub fn render_index(mode: PageMode, days: &[ViewModel], percent: f64) -> String {
    let (auth_hidden, days_hidden) = match mode {
        PageMode::Tracking => ("hidden", ""),
        PageMode::SignIn => ("", "hidden"),
    };
    let cards = days.iter().fold(String::new(), |mut out, view| {
        out.push_str(&render_card(view));
        out
    });

    INDEX_HTML
        .replace("{{MODE}}", mode.as_str())
        .replace("{{AUTH_HIDDEN}}", auth_hidden)
        .replace("{{DAYS_HIDDEN}}", days_hidden)
        .replace("{{PERCENT}}", &format_percent(percent))
        .replace("{{CARDS}}", &cards)
}

pub fn render_card(view: &ViewModel) -> String {
    let completed_on = view
        .completed_at
        .map(|date| format!("• Completed on {date}"))
        .unwrap_or_default();
    let (class, label) = if view.completed {
        ("day-card completed", "Completed ✔")
    } else {
        ("day-card", "Mark Complete")
    };

    // The parser drops one newline right after <textarea>, so emit it
    // ourselves and notes that start with a line break survive.
    format!(
        r#"<div class="{class}" id="day-{day}">
  <h2>Day {day} <span class="completion-date">{completed_on}</span></h2>
  <p>{topic}</p>
  <textarea data-day="{day}" aria-label="Notes for day {day}">
{notes}</textarea>
  <button class="complete-btn" type="button" data-day="{day}">{label}</button>
</div>
"#,
        day = view.day,
        topic = escape_html(&view.topic),
        notes = escape_html(&view.notes),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn format_percent(percent: f64) -> String {
    let rounded = (percent * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>100 Days</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --done: #2d7a4b;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    .hidden {
      display: none !important;
    }

    h1 {
      font-family: "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .progress-bar {
      height: 14px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.1);
      overflow: hidden;
    }

    #progress-fill {
      height: 100%;
      background: var(--accent);
      transition: width 200ms ease;
    }

    #auth {
      display: flex;
      gap: 12px;
      flex-wrap: wrap;
    }

    #auth input {
      flex: 1;
      min-width: 220px;
      border-radius: 999px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      padding: 12px 18px;
      font-size: 1rem;
    }

    #days-container {
      display: grid;
      gap: 16px;
    }

    .day-card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 10px;
    }

    .day-card.completed {
      border-color: var(--done);
    }

    .day-card h2 {
      margin: 0;
      font-size: 1.2rem;
    }

    .completion-date {
      font-size: 0.85rem;
      color: var(--done);
    }

    textarea {
      min-height: 64px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.15);
      padding: 10px;
      font: inherit;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
      justify-self: start;
    }

    button:disabled {
      opacity: 0.6;
      cursor: progress;
    }

    .day-card.completed .complete-btn {
      background: var(--done);
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body data-mode="{{MODE}}">
  <main class="app">
    <header>
      <h1>100 Days</h1>
      <p><span id="percent">{{PERCENT}}</span>% complete</p>
      <div class="progress-bar"><div id="progress-fill" style="width: {{PERCENT}}%"></div></div>
    </header>

    <section id="auth" class="{{AUTH_HIDDEN}}">
      <input id="email" type="email" placeholder="you@example.com" />
      <button id="login-btn" type="button">Send login link</button>
    </section>

    <div class="status" id="status"></div>

    <section id="days-container" class="{{DAYS_HIDDEN}}">
{{CARDS}}    </section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const percentEl = document.getElementById('percent');
    const fillEl = document.getElementById('progress-fill');
    const authEl = document.getElementById('auth');
    const daysEl = document.getElementById('days-container');
    const signInMode = document.body.dataset.mode === 'sign-in';
    const TOKEN_KEY = 'hundred-days-token';

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const updateProgressBar = (percent) => {
      const rounded = Math.round(percent * 10) / 10;
      percentEl.textContent = rounded;
      fillEl.style.width = `${Math.min(rounded, 100)}%`;
    };

    const authHeaders = () => {
      const token = sessionStorage.getItem(TOKEN_KEY);
      return token ? { authorization: `Bearer ${token}` } : {};
    };

    const signOut = (message) => {
      sessionStorage.removeItem(TOKEN_KEY);
      daysEl.replaceChildren();
      daysEl.classList.add('hidden');
      authEl.classList.remove('hidden');
      updateProgressBar(0);
      setStatus(message || '', message ? 'error' : '');
    };

    const applyView = (card, view) => {
      card.classList.toggle('completed', view.completed);
      card.querySelector('.completion-date').textContent =
        view.completed_at ? `• Completed on ${view.completed_at}` : '';
      card.querySelector('.complete-btn').textContent =
        view.completed ? 'Completed ✔' : 'Mark Complete';
    };

    const patchCard = (view) => {
      const card = document.getElementById(`day-${view.day}`);
      if (!card) {
        return;
      }
      applyView(card, view);
      if (!view.completed) {
        card.querySelector('textarea').value = view.notes;
      }
    };

    const buildCard = (view) => {
      const card = document.createElement('div');
      card.className = 'day-card';
      card.id = `day-${view.day}`;

      const title = document.createElement('h2');
      title.textContent = `Day ${view.day} `;
      const date = document.createElement('span');
      date.className = 'completion-date';
      title.appendChild(date);

      const topic = document.createElement('p');
      topic.textContent = view.topic;

      const notes = document.createElement('textarea');
      notes.dataset.day = view.day;
      notes.setAttribute('aria-label', `Notes for day ${view.day}`);
      notes.value = view.notes;

      const button = document.createElement('button');
      button.className = 'complete-btn';
      button.type = 'button';
      button.dataset.day = view.day;

      card.append(title, topic, notes, button);
      applyView(card, view);
      return card;
    };

    const loadDays = async () => {
      const res = await fetch('/api/days', { headers: authHeaders() });
      if (res.status === 401) {
        signOut('Your session has expired. Please sign in again.');
        return;
      }
      if (!res.ok) {
        throw new Error(await res.text() || 'Could not load progress');
      }
      const data = await res.json();
      daysEl.replaceChildren(...data.days.map(buildCard));
      daysEl.classList.remove('hidden');
      authEl.classList.add('hidden');
      updateProgressBar(data.percent);
    };

    const toggleDay = async (button) => {
      const day = button.dataset.day;
      const textarea = document.querySelector(`textarea[data-day="${day}"]`);
      button.disabled = true;
      setStatus('Saving...', 'info');
      try {
        const res = await fetch(`/api/days/${day}/toggle`, {
          method: 'POST',
          headers: { 'content-type': 'application/json', ...authHeaders() },
          body: JSON.stringify({ notes: textarea ? textarea.value : '' })
        });
        if (res.status === 401) {
          signOut('Your session has expired. Please sign in again.');
          return;
        }
        if (!res.ok) {
          const msg = await res.text();
          throw new Error(msg || 'Could not save progress');
        }
        const data = await res.json();
        patchCard(data.day);
        updateProgressBar(data.percent);
        setStatus('Saved', 'ok');
        setTimeout(() => setStatus('', ''), 1200);
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        button.disabled = false;
      }
    };

    document.addEventListener('click', (event) => {
      const button = event.target.closest('.complete-btn');
      if (button && !button.disabled) {
        toggleDay(button);
      }
    });

    const loginBtn = document.getElementById('login-btn');
    loginBtn.addEventListener('click', async () => {
      const email = document.getElementById('email').value;
      if (!email) {
        setStatus('Please enter your email.', 'error');
        return;
      }
      loginBtn.disabled = true;
      try {
        const res = await fetch('/api/login', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify({ email })
        });
        const msg = res.ok ? (await res.json()).message : await res.text();
        setStatus(msg, res.ok ? 'ok' : 'error');
      } catch (err) {
        setStatus(err.message, 'error');
      } finally {
        loginBtn.disabled = false;
      }
    });

    const finishSignIn = async () => {
      const params = new URLSearchParams(window.location.hash.slice(1));
      const token = params.get('access_token');
      if (token) {
        history.replaceState(null, '', window.location.pathname);
        const res = await fetch('/api/session', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify({ access_token: token })
        });
        if (!res.ok) {
          throw new Error(await res.text() || 'Sign-in failed');
        }
        sessionStorage.setItem(TOKEN_KEY, token);
      }
      if (sessionStorage.getItem(TOKEN_KEY)) {
        await loadDays();
      }
    };

    if (signInMode) {
      finishSignIn().catch((err) => setStatus(err.message, 'error'));
    }
  </script>
</body>
</html>
"#;
